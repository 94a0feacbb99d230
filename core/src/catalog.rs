use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::question::{NumberRange, OperationKind};

pub const QUESTIONS_PER_SESSION: usize = 5;
pub const MAX_SKILL_LEVEL: u8 = 5;
pub const LEVEL_UP_MASTERY: u8 = 80;
pub const LEVEL_UP_MIN_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Fruits,
    Animals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Level {
    pub id: u32,
    pub name: &'static str,
    pub operation: OperationKind,
    pub range: NumberRange,
    pub theme: Theme,
}

const fn level(
    id: u32,
    name: &'static str,
    operation: OperationKind,
    min: u32,
    max: u32,
    theme: Theme,
) -> Level {
    Level {
        id,
        name,
        operation,
        range: NumberRange::new(min, max),
        theme,
    }
}

pub const LEVELS: [Level; 9] = [
    level(1, "Simple Addition", OperationKind::Addition, 1, 10, Theme::Fruits),
    level(2, "Stepping-up Addition", OperationKind::Addition, 10, 20, Theme::Animals),
    level(3, "Challenge Addition", OperationKind::Addition, 10, 50, Theme::Fruits),
    level(4, "Simple Subtraction", OperationKind::Subtraction, 1, 10, Theme::Animals),
    level(5, "Stepping-up Subtraction", OperationKind::Subtraction, 10, 20, Theme::Fruits),
    level(6, "Challenge Subtraction", OperationKind::Subtraction, 10, 50, Theme::Animals),
    level(7, "Mixed Practice I", OperationKind::Mixed, 1, 20, Theme::Fruits),
    level(8, "Mixed Practice II", OperationKind::Mixed, 10, 30, Theme::Animals),
    level(9, "Math Master", OperationKind::Mixed, 10, 50, Theme::Fruits),
];

pub fn level_by_id(id: u32) -> Result<&'static Level, GameError> {
    LEVELS
        .iter()
        .find(|l| l.id == id)
        .ok_or(GameError::UnknownLevel(id))
}

pub fn has_next_level(id: u32) -> bool {
    LEVELS.iter().any(|l| l.id == id + 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillKind {
    AddNoCarry,
    AddWithCarry,
    SubNoBorrow,
    SubWithBorrow,
    AddTens,
    SubTens,
}

impl SkillKind {
    pub const ALL: [SkillKind; 6] = [
        SkillKind::AddNoCarry,
        SkillKind::AddWithCarry,
        SkillKind::SubNoBorrow,
        SkillKind::SubWithBorrow,
        SkillKind::AddTens,
        SkillKind::SubTens,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillKind::AddNoCarry => "add_no_carry",
            SkillKind::AddWithCarry => "add_with_carry",
            SkillKind::SubNoBorrow => "sub_no_borrow",
            SkillKind::SubWithBorrow => "sub_with_borrow",
            SkillKind::AddTens => "add_tens",
            SkillKind::SubTens => "sub_tens",
        }
    }
}

impl fmt::Display for SkillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SkillKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| GameError::UnknownSkill(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkillLevel {
    pub range: NumberRange,
    pub questions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Skill {
    pub kind: SkillKind,
    pub name: &'static str,
    pub description: &'static str,
    pub levels: [SkillLevel; MAX_SKILL_LEVEL as usize],
}

impl Skill {
    pub fn level(&self, level: u8) -> &SkillLevel {
        let idx = level.clamp(1, MAX_SKILL_LEVEL) as usize - 1;
        &self.levels[idx]
    }
}

const fn lvl(min: u32, max: u32) -> SkillLevel {
    SkillLevel {
        range: NumberRange::new(min, max),
        questions: QUESTIONS_PER_SESSION,
    }
}

pub const SKILLS: [Skill; 6] = [
    Skill {
        kind: SkillKind::AddNoCarry,
        name: "Addition without carrying",
        description: "Ones digits add up to less than ten",
        levels: [
            lvl(1, 9),
            lvl(10, 29),
            lvl(20, 49),
            lvl(30, 69),
            lvl(40, 89),
        ],
    },
    Skill {
        kind: SkillKind::AddWithCarry,
        name: "Addition with carrying",
        description: "Ones digits add up to ten or more",
        levels: [
            lvl(5, 15),
            lvl(10, 30),
            lvl(20, 50),
            lvl(30, 70),
            lvl(40, 90),
        ],
    },
    Skill {
        kind: SkillKind::SubNoBorrow,
        name: "Subtraction without borrowing",
        description: "The top ones digit is big enough",
        levels: [
            lvl(1, 9),
            lvl(10, 29),
            lvl(20, 49),
            lvl(30, 69),
            lvl(40, 89),
        ],
    },
    Skill {
        kind: SkillKind::SubWithBorrow,
        name: "Subtraction with borrowing",
        description: "The top ones digit is too small and needs a borrow",
        levels: [
            lvl(11, 20),
            lvl(20, 40),
            lvl(30, 60),
            lvl(40, 80),
            lvl(50, 99),
        ],
    },
    Skill {
        kind: SkillKind::AddTens,
        name: "Adding tens",
        description: "Adding whole tens",
        levels: [
            lvl(10, 30),
            lvl(10, 50),
            lvl(10, 70),
            lvl(10, 90),
            lvl(10, 90),
        ],
    },
    Skill {
        kind: SkillKind::SubTens,
        name: "Subtracting tens",
        description: "Subtracting whole tens",
        levels: [
            lvl(10, 30),
            lvl(20, 50),
            lvl(30, 70),
            lvl(40, 90),
            lvl(50, 90),
        ],
    },
];

pub fn skill(kind: SkillKind) -> &'static Skill {
    match kind {
        SkillKind::AddNoCarry => &SKILLS[0],
        SkillKind::AddWithCarry => &SKILLS[1],
        SkillKind::SubNoBorrow => &SKILLS[2],
        SkillKind::SubWithBorrow => &SKILLS[3],
        SkillKind::AddTens => &SKILLS[4],
        SkillKind::SubTens => &SKILLS[5],
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeMode {
    #[default]
    #[serde(rename = "60s")]
    OneMinute,
    #[serde(rename = "120s")]
    TwoMinutes,
    #[serde(rename = "180s")]
    ThreeMinutes,
}

impl TimeMode {
    pub const ALL: [TimeMode; 3] = [
        TimeMode::OneMinute,
        TimeMode::TwoMinutes,
        TimeMode::ThreeMinutes,
    ];

    pub fn seconds(&self) -> u32 {
        match self {
            TimeMode::OneMinute => 60,
            TimeMode::TwoMinutes => 120,
            TimeMode::ThreeMinutes => 180,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeMode::OneMinute => "60s",
            TimeMode::TwoMinutes => "120s",
            TimeMode::ThreeMinutes => "180s",
        }
    }
}

impl FromStr for TimeMode {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| GameError::UnknownTimeMode(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn range(&self) -> NumberRange {
        match self {
            Difficulty::Easy => NumberRange::new(1, 20),
            Difficulty::Medium => NumberRange::new(10, 50),
            Difficulty::Hard => NumberRange::new(20, 99),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| GameError::UnknownDifficulty(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ids_are_sequential() {
        for (i, level) in LEVELS.iter().enumerate() {
            assert_eq!(level.id as usize, i + 1);
        }
        assert!(has_next_level(8));
        assert!(!has_next_level(9));
        assert!(matches!(level_by_id(10), Err(GameError::UnknownLevel(10))));
    }

    #[test]
    fn skill_lookup_matches_kind() {
        for kind in SkillKind::ALL {
            assert_eq!(skill(kind).kind, kind);
            assert_eq!(kind.as_str().parse::<SkillKind>().unwrap(), kind);
        }
        assert!("multiply".parse::<SkillKind>().is_err());
    }

    #[test]
    fn skill_level_is_clamped() {
        let s = skill(SkillKind::SubWithBorrow);
        assert_eq!(s.level(0).range, NumberRange::new(11, 20));
        assert_eq!(s.level(9).range, NumberRange::new(50, 99));
        assert!(SKILLS
            .iter()
            .all(|s| s.levels.iter().all(|l| l.questions == QUESTIONS_PER_SESSION)));
    }

    #[test]
    fn time_modes_and_difficulties_parse() {
        assert_eq!("120s".parse::<TimeMode>().unwrap().seconds(), 120);
        assert_eq!("hard".parse::<Difficulty>().unwrap().range(), NumberRange::new(20, 99));
        assert!("90s".parse::<TimeMode>().is_err());
    }
}
