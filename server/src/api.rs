use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use mq_core::catalog::{skill, Difficulty, Level, Skill, SkillKind, TimeMode};
use mq_core::notebook::{
    delete_all_mistakes, delete_mistake, list_mistakes, mistake_stats, MistakeFilter, MistakeStats,
};
use mq_core::progress::{skill_overview, LevelBoard};
use mq_core::records::{Collection, MistakeNote, SkillProgress, TimeChallengeScore};
use mq_core::session::{
    leaderboard, LevelFeedback, LevelPhase, LevelSession, MistakeReview, Notice, ReviewFeedback,
    ReviewSummary, SkillFeedback, SkillPhase, SkillPractice, SkillSummary, TimeChallenge,
    TimedFeedback, TimedPhase, TimedSummary, LEADERBOARD_SIZE,
};
use mq_core::{parse_answer, GameError, MemoryStore, Question, StoreError, Stored};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::timer::Countdown;

const TICK: Duration = Duration::from_secs(1);

// ── App state ─────────────────────────────────────────────────────────────────

/// The single player's store, RNG and open sessions.
pub struct AppState {
    game: Mutex<Game>,
}

struct Game {
    store: MemoryStore,
    rng: StdRng,
    level: Option<LevelSession>,
    timed: TimeChallenge,
    countdown: Option<Countdown>,
    /// Bumped on every time-challenge start so a stale tick can tell it
    /// belongs to an earlier run.
    run: u64,
    skill: SkillPractice,
    review: Option<MistakeReview>,
}

impl AppState {
    pub fn new(rng: StdRng) -> Arc<Self> {
        Arc::new(Self {
            game: Mutex::new(Game {
                store: MemoryStore::new(),
                rng,
                level: None,
                timed: TimeChallenge::new(),
                countdown: None,
                run: 0,
                skill: SkillPractice::new(),
                review: None,
            }),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Game>, (StatusCode, String)> {
        self.game.lock().map_err(|_| internal("game state lock poisoned"))
    }
}

// ── Request / Response types ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct AnswerRequest {
    answer: String,
}

#[derive(Deserialize)]
struct TimedSettings {
    mode: TimeMode,
    difficulty: Difficulty,
}

#[derive(Deserialize)]
struct FilterQuery {
    filter: Option<String>,
}

/// Which notes a review goes through. `id` picks a single note and wins
/// over `scope`.
#[derive(Deserialize)]
struct ReviewQuery {
    filter: Option<String>,
    #[serde(default)]
    scope: ReviewScope,
    id: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ReviewScope {
    #[default]
    Unpracticed,
    /// Every note under the filter, practiced or not.
    Filtered,
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct LevelView {
    level: Level,
    phase: LevelPhase,
    question_number: usize,
    total: u32,
    score: u32,
    question: Option<Question>,
}

#[derive(Debug, Serialize)]
struct TimedView {
    phase: TimedPhase,
    mode: TimeMode,
    difficulty: Difficulty,
    time_left: u32,
    score: u32,
    total_attempted: u32,
    accuracy: u8,
    streak: u32,
    max_streak: u32,
    best_score: u32,
    question: Option<Question>,
    summary: Option<TimedSummary>,
}

#[derive(Debug, Serialize)]
struct SkillCard {
    skill: &'static Skill,
    progress: SkillProgress,
}

#[derive(Debug, Serialize)]
struct SkillView {
    phase: SkillPhase,
    skill: Option<SkillKind>,
    level: Option<u8>,
    question_number: usize,
    score: u32,
    question: Option<Question>,
    summary: Option<SkillSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notices: Vec<Notice>,
}

#[derive(Debug, Serialize)]
struct ReviewView {
    question: Option<Question>,
    remaining: usize,
    finished: bool,
    summary: ReviewSummary,
}

#[derive(Debug, Serialize)]
struct DeletedResponse {
    deleted: usize,
}

fn level_view(session: &LevelSession) -> LevelView {
    LevelView {
        level: *session.level(),
        phase: session.phase(),
        question_number: session.question_number(),
        total: session.total(),
        score: session.score(),
        question: session.current().copied(),
    }
}

fn timed_view(game: &Game) -> Result<TimedView, (StatusCode, String)> {
    let timed = &game.timed;
    Ok(TimedView {
        phase: timed.phase(),
        mode: timed.mode(),
        difficulty: timed.difficulty(),
        time_left: timed.time_left(),
        score: timed.score(),
        total_attempted: timed.total_attempted(),
        accuracy: timed.accuracy(),
        streak: timed.streak(),
        max_streak: timed.max_streak(),
        best_score: timed.best_score(&game.store).map_err(store_err)?,
        question: timed.current().copied(),
        summary: timed.summary().cloned(),
    })
}

fn skill_view(practice: &SkillPractice, notices: Vec<Notice>) -> SkillView {
    SkillView {
        phase: practice.phase(),
        skill: practice.skill(),
        level: practice.level(),
        question_number: practice.question_number(),
        score: practice.score(),
        question: practice.current().copied(),
        summary: practice.summary().cloned(),
        notices,
    }
}

fn review_view(review: &MistakeReview) -> ReviewView {
    ReviewView {
        question: review.current().map(|note| note.question()),
        remaining: review.remaining(),
        finished: review.is_finished(),
        summary: review.summary(),
    }
}

// ── Error helpers ─────────────────────────────────────────────────────────────

type AppResult<T> = Result<Json<T>, (StatusCode, String)>;

fn app_err(status: StatusCode, msg: impl ToString) -> (StatusCode, String) {
    (status, msg.to_string())
}

fn internal(msg: impl ToString) -> (StatusCode, String) {
    app_err(StatusCode::INTERNAL_SERVER_ERROR, msg)
}

fn game_err(err: GameError) -> (StatusCode, String) {
    let status = match &err {
        GameError::UnknownLevel(_)
        | GameError::UnknownSkill(_)
        | GameError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
        GameError::UnknownTimeMode(_)
        | GameError::UnknownDifficulty(_)
        | GameError::UnknownFilter(_) => StatusCode::BAD_REQUEST,
        GameError::LevelLocked(_) => StatusCode::FORBIDDEN,
        GameError::NotPlaying | GameError::InvalidTransition { .. } | GameError::EmptyReview => {
            StatusCode::CONFLICT
        }
        GameError::Generate(_) | GameError::Store(_) => {
            warn!(error = %err, "request failed");
            return internal(err);
        }
    };
    app_err(status, err)
}

fn store_err(err: StoreError) -> (StatusCode, String) {
    game_err(err.into())
}

fn not_playing() -> (StatusCode, String) {
    game_err(GameError::NotPlaying)
}

fn parse_filter(filter: Option<&str>) -> Result<MistakeFilter, (StatusCode, String)> {
    filter.unwrap_or("all").parse().map_err(game_err)
}

// ── Countdown ─────────────────────────────────────────────────────────────────

/// One second off the running time challenge. Breaks once the run is over,
/// replaced by a newer one, or the state is gone.
fn tick_time_challenge(state: &Weak<AppState>, run: u64) -> ControlFlow<()> {
    let Some(state) = state.upgrade() else {
        return ControlFlow::Break(());
    };
    let Ok(mut guard) = state.game.lock() else {
        return ControlFlow::Break(());
    };
    let game = &mut *guard;
    if game.run != run || game.timed.phase() != TimedPhase::Playing {
        return ControlFlow::Break(());
    }
    match game.timed.tick(&mut game.store) {
        Some(summary) => {
            info!(score = summary.score, stars = summary.stars, "time is up");
            ControlFlow::Break(())
        }
        None => ControlFlow::Continue(()),
    }
}

// ── Level handlers ────────────────────────────────────────────────────────────

async fn get_levels(State(state): State<Arc<AppState>>) -> AppResult<LevelBoard> {
    let game = state.lock()?;
    LevelBoard::load(&game.store).map(Json).map_err(store_err)
}

async fn start_level(
    State(state): State<Arc<AppState>>,
    Path(level_id): Path<u32>,
) -> AppResult<LevelView> {
    let mut game = state.lock()?;
    let board = LevelBoard::load(&game.store).map_err(store_err)?;
    if board.status(level_id).is_some_and(|status| !status.unlocked) {
        return Err(game_err(GameError::LevelLocked(level_id)));
    }
    let session = LevelSession::start(level_id, &mut game.rng).map_err(game_err)?;
    let view = level_view(&session);
    game.level = Some(session);
    Ok(Json(view))
}

async fn get_play(State(state): State<Arc<AppState>>) -> AppResult<LevelView> {
    let game = state.lock()?;
    let session = game.level.as_ref().ok_or_else(not_playing)?;
    Ok(Json(level_view(session)))
}

async fn answer_level(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnswerRequest>,
) -> AppResult<Option<LevelFeedback>> {
    let Some(answer) = parse_answer(&req.answer) else {
        return Ok(Json(None));
    };
    let mut guard = state.lock()?;
    let game = &mut *guard;
    let session = game.level.as_mut().ok_or_else(not_playing)?;
    let feedback = session.submit(&mut game.store, answer).map_err(game_err)?;
    Ok(Json(Some(feedback)))
}

async fn retry_level(State(state): State<Arc<AppState>>) -> AppResult<LevelView> {
    let mut guard = state.lock()?;
    let game = &mut *guard;
    let session = game.level.as_mut().ok_or_else(not_playing)?;
    session.retry(&mut game.rng).map_err(game_err)?;
    Ok(Json(level_view(session)))
}

// ── Time challenge handlers ───────────────────────────────────────────────────

async fn get_timed(State(state): State<Arc<AppState>>) -> AppResult<TimedView> {
    let game = state.lock()?;
    timed_view(&game).map(Json)
}

async fn configure_timed(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<TimedSettings>,
) -> AppResult<TimedView> {
    let mut game = state.lock()?;
    game.timed
        .configure(settings.mode, settings.difficulty)
        .map_err(game_err)?;
    timed_view(&game).map(Json)
}

async fn start_timed(State(state): State<Arc<AppState>>) -> AppResult<TimedView> {
    let weak = Arc::downgrade(&state);
    let mut guard = state.lock()?;
    let game = &mut *guard;
    game.timed.start(&mut game.rng).map_err(game_err)?;

    game.run += 1;
    let run = game.run;
    game.countdown = Some(Countdown::spawn(TICK, move || {
        tick_time_challenge(&weak, run)
    }));
    timed_view(game).map(Json)
}

async fn answer_timed(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnswerRequest>,
) -> AppResult<Option<TimedFeedback>> {
    let Some(answer) = parse_answer(&req.answer) else {
        return Ok(Json(None));
    };
    let mut guard = state.lock()?;
    let game = &mut *guard;
    let feedback = game
        .timed
        .submit(&mut game.store, &mut game.rng, answer)
        .map_err(game_err)?;
    Ok(Json(Some(feedback)))
}

async fn back_to_setup(State(state): State<Arc<AppState>>) -> AppResult<TimedView> {
    let mut game = state.lock()?;
    game.timed.back_to_setup().map_err(game_err)?;
    game.countdown = None;
    timed_view(&game).map(Json)
}

async fn get_scores(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Vec<Stored<TimeChallengeScore>>> {
    let game = state.lock()?;
    let limit = query.limit.unwrap_or(LEADERBOARD_SIZE);
    leaderboard(&game.store, limit).map(Json).map_err(store_err)
}

// ── Skill handlers ────────────────────────────────────────────────────────────

async fn get_skills(State(state): State<Arc<AppState>>) -> AppResult<Vec<SkillCard>> {
    let game = state.lock()?;
    let cards = skill_overview(&game.store)
        .map_err(store_err)?
        .into_iter()
        .map(|progress| SkillCard {
            skill: skill(progress.skill_type),
            progress,
        })
        .collect();
    Ok(Json(cards))
}

async fn start_skill(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> AppResult<SkillView> {
    let kind: SkillKind = name.parse().map_err(game_err)?;
    let mut guard = state.lock()?;
    let game = &mut *guard;
    let notices = game
        .skill
        .start(&game.store, &mut game.rng, kind)
        .map_err(game_err)?;
    Ok(Json(skill_view(&game.skill, notices)))
}

async fn get_skill_session(State(state): State<Arc<AppState>>) -> AppResult<SkillView> {
    let game = state.lock()?;
    Ok(Json(skill_view(&game.skill, Vec::new())))
}

async fn answer_skill(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnswerRequest>,
) -> AppResult<Option<SkillFeedback>> {
    let Some(answer) = parse_answer(&req.answer) else {
        return Ok(Json(None));
    };
    let mut guard = state.lock()?;
    let game = &mut *guard;
    let feedback = game
        .skill
        .submit(&mut game.store, answer)
        .map_err(game_err)?;
    Ok(Json(Some(feedback)))
}

async fn back_to_skills(State(state): State<Arc<AppState>>) -> AppResult<SkillView> {
    let mut game = state.lock()?;
    game.skill.back_to_select().map_err(game_err)?;
    Ok(Json(skill_view(&game.skill, Vec::new())))
}

// ── Mistake notebook handlers ─────────────────────────────────────────────────

async fn get_mistakes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> AppResult<Vec<Stored<MistakeNote>>> {
    let filter = parse_filter(query.filter.as_deref())?;
    let game = state.lock()?;
    list_mistakes(&game.store, filter).map(Json).map_err(store_err)
}

async fn get_mistake_stats(State(state): State<Arc<AppState>>) -> AppResult<MistakeStats> {
    let game = state.lock()?;
    mistake_stats(&game.store).map(Json).map_err(store_err)
}

async fn delete_one_mistake(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut game = state.lock()?;
    delete_mistake(&mut game.store, id).map_err(store_err)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_every_mistake(State(state): State<Arc<AppState>>) -> AppResult<DeletedResponse> {
    let mut game = state.lock()?;
    let deleted = delete_all_mistakes(&mut game.store).map_err(store_err)?;
    game.review = None;
    Ok(Json(DeletedResponse { deleted }))
}

async fn start_review(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReviewQuery>,
) -> AppResult<ReviewView> {
    let filter = parse_filter(query.filter.as_deref())?;
    let mut game = state.lock()?;
    let review = match (query.id, query.scope) {
        (Some(id), _) => {
            let note = list_mistakes(&game.store, MistakeFilter::All)
                .map_err(store_err)?
                .into_iter()
                .find(|note| note.id == id)
                .ok_or_else(|| {
                    store_err(StoreError::NotFound {
                        collection: Collection::MistakeNote,
                        id,
                    })
                })?;
            MistakeReview::new(vec![note])
        }
        (None, ReviewScope::Unpracticed) => MistakeReview::unpracticed(&game.store, filter),
        (None, ReviewScope::Filtered) => list_mistakes(&game.store, filter)
            .map_err(GameError::from)
            .and_then(MistakeReview::new),
    }
    .map_err(game_err)?;
    let view = review_view(&review);
    game.review = Some(review);
    Ok(Json(view))
}

async fn get_review(State(state): State<Arc<AppState>>) -> AppResult<ReviewView> {
    let game = state.lock()?;
    let review = game.review.as_ref().ok_or_else(not_playing)?;
    Ok(Json(review_view(review)))
}

async fn answer_review(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnswerRequest>,
) -> AppResult<Option<ReviewFeedback>> {
    let Some(answer) = parse_answer(&req.answer) else {
        return Ok(Json(None));
    };
    let mut guard = state.lock()?;
    let game = &mut *guard;
    let review = game.review.as_mut().ok_or_else(not_playing)?;
    let feedback = review.submit(&mut game.store, answer).map_err(game_err)?;
    Ok(Json(Some(feedback)))
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/levels", get(get_levels))
        .route("/api/levels/:id/play", post(start_level))
        .route("/api/play", get(get_play))
        .route("/api/play/answer", post(answer_level))
        .route("/api/play/retry", post(retry_level))
        .route("/api/timed", get(get_timed))
        .route("/api/timed/settings", post(configure_timed))
        .route("/api/timed/start", post(start_timed))
        .route("/api/timed/answer", post(answer_timed))
        .route("/api/timed/setup", post(back_to_setup))
        .route("/api/scores", get(get_scores))
        .route("/api/skills", get(get_skills))
        .route("/api/skills/:skill/start", post(start_skill))
        .route("/api/skills/session", get(get_skill_session))
        .route("/api/skills/answer", post(answer_skill))
        .route("/api/skills/select", post(back_to_skills))
        .route(
            "/api/mistakes",
            get(get_mistakes).delete(delete_every_mistake),
        )
        .route("/api/mistakes/stats", get(get_mistake_stats))
        .route("/api/mistakes/:id", delete(delete_one_mistake))
        .route("/api/mistakes/review", get(get_review).post(start_review))
        .route("/api/mistakes/review/answer", post(answer_review))
        .with_state(state)
}
