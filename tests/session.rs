mod common;

use common::{orchestrator, Reply, StubGenerator, StubImprover};
use imaginai::{GenerationSession, ImaginError, SessionState};
use std::sync::Arc;

fn session(improver: &Arc<StubImprover>, generator: &Arc<StubGenerator>) -> GenerationSession {
    GenerationSession::new(Arc::new(orchestrator(improver, generator)))
}

#[tokio::test]
async fn regenerate_reuses_original_prompt_not_improved_one() {
    let improver = StubImprover::replying(vec![
        Reply::Ok("first rewrite".into()),
        Reply::Ok("second rewrite".into()),
    ]);
    let generator = StubGenerator::returning(Some("https://example.com/img.png"));
    let mut session = session(&improver, &generator);

    session.submit("a peaceful forest").await.unwrap();
    let outcome = session.regenerate().await.unwrap();

    assert_eq!(improver.calls(), vec!["a peaceful forest", "a peaceful forest"]);
    assert_eq!(generator.calls(), vec!["first rewrite", "second rewrite"]);
    assert_eq!(outcome.improved_prompt.as_deref(), Some("second rewrite"));
}

#[tokio::test]
async fn regenerate_without_submission_is_rejected() {
    let improver = StubImprover::always("x");
    let generator = StubGenerator::returning(Some("https://example.com/img.png"));
    let mut session = session(&improver, &generator);

    assert!(matches!(
        session.regenerate().await,
        Err(ImaginError::SessionError(_))
    ));
    assert!(improver.calls().is_empty());
}

#[tokio::test]
async fn blank_submission_leaves_session_untouched() {
    let improver = StubImprover::always("x");
    let generator = StubGenerator::returning(Some("https://example.com/img.png"));
    let mut session = session(&improver, &generator);

    assert!(session.submit("   ").await.is_err());
    assert_eq!(session.state(), &SessionState::Idle);
    assert_eq!(session.original_prompt(), None);
    assert!(improver.calls().is_empty());
}

#[tokio::test]
async fn failure_moves_to_failed_and_regenerate_still_works() {
    let improver = StubImprover::replying(vec![Reply::Ok(String::new()), Reply::Ok("ok".into())]);
    let generator = StubGenerator::returning(Some("https://example.com/img.png"));
    let mut session = session(&improver, &generator);

    session.submit("a storm").await.unwrap();
    assert!(matches!(session.state(), SessionState::Failed { .. }));
    assert_eq!(session.prompt_enhancement(), None);

    session.regenerate().await.unwrap();
    assert!(matches!(session.state(), SessionState::Success { .. }));
}

#[tokio::test]
async fn prompt_enhancement_only_when_prompt_changed() {
    let improver = StubImprover::always("a peaceful forest");
    let generator = StubGenerator::returning(Some("https://example.com/img.png"));
    let mut session = session(&improver, &generator);

    session.submit("a peaceful forest").await.unwrap();
    assert_eq!(session.prompt_enhancement(), None);

    let improver = StubImprover::always("a peaceful forest, digital art");
    let mut session = self::session(&improver, &generator);
    session.submit("a peaceful forest").await.unwrap();
    assert_eq!(
        session.prompt_enhancement(),
        Some("a peaceful forest, digital art")
    );
}

#[tokio::test]
async fn download_writes_decoded_data_uri() {
    let improver = StubImprover::always("a cat on a mat, watercolor");
    let generator = StubGenerator::returning(Some("data:image/png;base64,iVBORw0KGgo="));
    let mut session = session(&improver, &generator);
    let dir = tempfile::tempdir().unwrap();

    session.submit("A cat, on a mat!").await.unwrap();
    let path = session.download(dir.path()).await.unwrap();

    assert_eq!(
        path.file_name().unwrap().to_str(),
        Some("imaginai_A_cat__on_a_mat_.png")
    );
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes, vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
}

#[tokio::test]
async fn download_requires_a_successful_image() {
    let improver = StubImprover::always("");
    let generator = StubGenerator::returning(Some("data:image/png;base64,QQ=="));
    let mut session = session(&improver, &generator);
    let dir = tempfile::tempdir().unwrap();

    assert!(session.download(dir.path()).await.is_err());
    session.submit("blocked prompt").await.unwrap();
    assert!(matches!(
        session.download(dir.path()).await,
        Err(ImaginError::SessionError(_))
    ));
}
