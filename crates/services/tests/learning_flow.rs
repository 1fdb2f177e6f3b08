use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use services::{
    LearningSession, LessonError, LessonOutcome, LessonState, ProgressError, SessionError,
    StudioServices,
};
use storage::{
    InMemoryBackend, LessonRepository, RoadmapContentRecord, RoadmapRecord, StorageError,
};
use studio_core::model::{
    LessonContent, LessonRequest, Module, Roadmap, RoadmapError, RoadmapId, TopicRef,
};

const ID: RoadmapId = RoadmapId::new(42);

fn roadmap() -> Roadmap {
    Roadmap::new(
        ID,
        "Rust Backend",
        Some("Services in Rust".into()),
        Some(vec![
            Module::new("Basics", vec!["Ownership".into(), "Borrowing".into()]),
            Module::new("Async", vec!["Futures".into()]),
        ]),
    )
    .unwrap()
}

fn seeded() -> InMemoryBackend {
    let repo = InMemoryBackend::new();
    repo.insert_roadmap(&roadmap());
    repo
}

async fn start(repo: &InMemoryBackend) -> LearningSession {
    StudioServices::in_memory(repo)
        .start_session(ID)
        .await
        .expect("session starts")
}

#[tokio::test]
async fn session_starts_with_persisted_progress() {
    let repo = seeded();
    repo.set_progress(ID, TopicRef::new(0, 1), true);
    repo.set_progress(ID, TopicRef::new(3, 3), true);

    let session = start(&repo).await;

    assert_eq!(session.active_topic(), TopicRef::new(0, 0));
    assert!(session.lesson_state().is_loading());
    assert_eq!(session.wait_for_progress().await.len(), 1);
    assert!(session.is_completed(TopicRef::new(0, 1)));

    let summary = session.progress();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.completed, 1);
}

#[tokio::test]
async fn malformed_roadmap_blocks_the_session() {
    let repo = InMemoryBackend::new();
    repo.insert_roadmap_record(
        ID,
        RoadmapRecord {
            id: Some(ID),
            title: "Half generated".into(),
            description: None,
            content: Some(RoadmapContentRecord { roadmap: None }),
        },
    );

    let err = StudioServices::in_memory(&repo)
        .start_session(ID)
        .await
        .err()
        .expect("malformed roadmap is fatal");
    assert!(matches!(err, SessionError::Roadmap(RoadmapError::MissingModules)));
}

#[tokio::test]
async fn missing_roadmap_is_reported() {
    let repo = InMemoryBackend::new();
    let err = StudioServices::in_memory(&repo)
        .start_session(ID)
        .await
        .err()
        .expect("unknown roadmap");
    assert!(matches!(
        err,
        SessionError::RoadmapUnavailable(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn progress_outage_does_not_block_lessons() {
    let repo = seeded();
    repo.set_progress(ID, TopicRef::new(0, 0), true);
    repo.fail_progress_reads(true);

    let session = start(&repo).await;
    let outcome = session.open_lesson().await.unwrap();
    assert_eq!(outcome.displayed().unwrap().title, "Ownership");
    assert!(session.wait_for_progress().await.is_empty());
}

#[tokio::test]
async fn slow_progress_does_not_delay_the_first_lesson() {
    let repo = seeded();
    repo.set_progress(ID, TopicRef::new(0, 1), true);
    repo.set_progress_read_latency(Duration::from_millis(300));

    let session = tokio::time::timeout(Duration::from_millis(150), async {
        let session = start(&repo).await;
        let outcome = session.open_lesson().await.unwrap();
        assert_eq!(outcome.displayed().unwrap().title, "Ownership");
        session
    })
    .await
    .expect("lesson shown while progress is still loading");

    assert!(!session.is_completed(TopicRef::new(0, 1)));
    session.wait_for_progress().await;
    assert!(session.is_completed(TopicRef::new(0, 1)));
}

#[tokio::test]
async fn toggle_during_progress_load_flips_the_loaded_state() {
    let repo = seeded();
    repo.set_progress(ID, TopicRef::new(0, 0), true);
    repo.set_progress_read_latency(Duration::from_millis(30));
    let session = start(&repo).await;

    assert!(!session.toggle_active().await.unwrap());
    assert!(!session.is_completed(TopicRef::new(0, 0)));
    assert!(!repo.is_completed(ID, TopicRef::new(0, 0)));
}

#[tokio::test]
async fn reselecting_a_viewed_topic_uses_the_cache() {
    let repo = seeded();
    let session = start(&repo).await;

    let first = session.open_lesson().await.unwrap();
    session.select_topic(TopicRef::new(0, 1)).unwrap();
    session.open_lesson().await.unwrap();
    assert_eq!(repo.lesson_requests(), 2);

    session.select_topic(TopicRef::new(0, 0)).unwrap();
    // A hit is shown on selection, without passing through Loading.
    let shown = session.lesson_state();
    assert!(Arc::ptr_eq(shown.lesson().unwrap(), first.displayed().unwrap()));

    let again = session.open_lesson().await.unwrap();
    assert!(Arc::ptr_eq(again.displayed().unwrap(), first.displayed().unwrap()));
    assert_eq!(repo.lesson_requests(), 2);
    assert_eq!(session.cached_lessons(), 2);
}

#[tokio::test]
async fn stale_response_is_not_displayed() {
    let repo = seeded();
    repo.set_lesson_latency(Duration::from_millis(20));
    let session = start(&repo).await;

    let (stale, ()) = tokio::join!(session.open_lesson(), async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        session.select_topic(TopicRef::new(0, 1)).unwrap();
    });

    assert_eq!(
        stale.unwrap(),
        LessonOutcome::Superseded {
            topic: TopicRef::new(0, 0)
        }
    );
    assert_eq!(session.active_topic(), TopicRef::new(0, 1));
    assert!(session.lesson_state().is_loading());
    // The abandoned response still filled the cache.
    assert_eq!(session.cached_lessons(), 1);

    let current = session.open_lesson().await.unwrap();
    assert_eq!(current.displayed().unwrap().title, "Borrowing");
}

#[tokio::test]
async fn advance_walks_the_roadmap_then_stops() {
    let repo = seeded();
    let session = start(&repo).await;

    assert_eq!(session.advance().unwrap(), Some(TopicRef::new(0, 1)));
    assert_eq!(session.advance().unwrap(), Some(TopicRef::new(1, 0)));
    assert!(!session.can_advance());
    assert_eq!(session.advance().unwrap(), None);
    assert_eq!(session.active_topic(), TopicRef::new(1, 0));
}

#[tokio::test]
async fn toggling_the_active_topic_round_trips() {
    let repo = seeded();
    let session = start(&repo).await;

    assert!(session.toggle_active().await.unwrap());
    assert!(session.is_completed(TopicRef::new(0, 0)));
    assert!(repo.is_completed(ID, TopicRef::new(0, 0)));

    assert!(!session.toggle_active().await.unwrap());
    assert!(!session.is_completed(TopicRef::new(0, 0)));
    assert!(!repo.is_completed(ID, TopicRef::new(0, 0)));
}

#[tokio::test]
async fn failed_toggle_rolls_back() {
    let repo = seeded();
    let session = start(&repo).await;
    repo.fail_progress_writes(true);

    let err = session.toggle_active().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Progress(ProgressError::Storage(StorageError::HttpStatus(500)))
    ));
    assert!(!session.is_completed(TopicRef::new(0, 0)));
}

#[tokio::test]
async fn signed_out_user_gets_explicit_errors() {
    let repo = seeded();
    let session = start(&repo).await;
    repo.set_signed_in(false);

    let err = session.open_lesson().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Lesson(LessonError::NotAuthenticated)
    ));
    assert_eq!(
        session.lesson_state(),
        LessonState::Failed(LessonError::NotAuthenticated)
    );

    let err = session.toggle_active().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Progress(ProgressError::NotAuthenticated)
    ));
    assert!(!session.is_completed(TopicRef::new(0, 0)));
}

#[tokio::test]
async fn failed_lesson_can_be_retried() {
    let repo = seeded();
    let session = start(&repo).await;

    repo.fail_lessons(true);
    assert!(session.open_lesson().await.is_err());
    assert!(matches!(session.lesson_state(), LessonState::Failed(_)));

    repo.fail_lessons(false);
    let outcome = session.open_lesson().await.unwrap();
    assert!(outcome.displayed().is_some());
    assert_eq!(repo.lesson_requests(), 2);
}

#[tokio::test]
async fn closing_discards_late_responses() {
    let repo = seeded();
    repo.set_lesson_latency(Duration::from_millis(20));
    let session = start(&repo).await;

    let (late, ()) = tokio::join!(session.open_lesson(), async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        session.close();
    });

    assert!(matches!(late.unwrap(), LessonOutcome::Superseded { .. }));
    assert!(session.lesson_state().is_loading());
    assert!(session.is_closed());
    assert!(matches!(
        session.select_topic(TopicRef::new(0, 1)),
        Err(SessionError::Closed)
    ));
}

#[tokio::test]
async fn unknown_topics_are_rejected() {
    let repo = seeded();
    let session = start(&repo).await;

    assert!(matches!(
        session.select_topic(TopicRef::new(1, 1)),
        Err(SessionError::UnknownTopic(_))
    ));
    assert!(matches!(
        session.toggle(TopicRef::new(9, 0)).await,
        Err(SessionError::Progress(ProgressError::UnknownTopic(_)))
    ));
    assert_eq!(session.active_topic(), TopicRef::new(0, 0));
}

// ─── Request shape ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingLessons {
    requests: Mutex<Vec<LessonRequest>>,
}

#[async_trait]
impl LessonRepository for RecordingLessons {
    async fn generate_lesson(
        &self,
        request: &LessonRequest,
    ) -> Result<LessonContent, StorageError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(LessonContent {
            title: request.topic.clone(),
            estimated_time: "10 mins".into(),
            content_markdown: String::new(),
        })
    }
}

#[tokio::test]
async fn lesson_requests_carry_roadmap_and_module_context() {
    let lessons = Arc::new(RecordingLessons::default());
    let session = LearningSession::new(
        Arc::new(roadmap()),
        Arc::clone(&lessons) as Arc<dyn LessonRepository>,
        Arc::new(InMemoryBackend::new()),
    );

    session.select_topic(TopicRef::new(1, 0)).unwrap();
    session.open_lesson().await.unwrap();

    let requests = lessons.requests.lock().unwrap();
    assert_eq!(
        *requests,
        vec![LessonRequest::new("Futures", "Rust Backend - Async")]
    );
}
