//! End-to-end channel behavior through the client API.

use std::time::Duration;

use anyhow::Result;
use mam::core::derive_root;
use mam::store::{MemoryLedger, SqliteLedger};
use mam::{
    decode_str, encode_str, FetchConfig, Mam, MamConfig, MamError, Mode, RetryPolicy,
    SecurityLevel, Seed,
};
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn config() -> MamConfig {
    MamConfig {
        security: SecurityLevel::Low,
        retry: RetryPolicy::fixed(3, Duration::from_millis(5)),
        fetch: FetchConfig {
            max_chain_length: 100,
            poll: RetryPolicy::fixed(6, Duration::from_millis(20)),
        },
    }
}

fn seed() -> Seed {
    Seed::new("SEEDVALUE").unwrap()
}

#[tokio::test]
async fn public_hello_roundtrip() -> Result<()> {
    init_tracing();
    let mam = Mam::new(MemoryLedger::new(), config());
    let state = mam.init(&mut rand::thread_rng(), Some(seed()));

    let (receipt, _) = mam.publish(&state, encode_str("HELLO")).await?;

    let result = mam.fetch_single(&receipt.root, Mode::Public, None).await?;
    assert_eq!(result.messages.len(), 1);
    assert_eq!(decode_str(&result.messages[0].payload)?, "HELLO");
    assert_eq!(
        result.next_root,
        Some(derive_root(&seed(), 1, SecurityLevel::Low))
    );
    Ok(())
}

#[tokio::test]
async fn restricted_channel_needs_the_right_key() -> Result<()> {
    init_tracing();
    let mam = Mam::new(MemoryLedger::new(), config());
    let state = mam.change_mode(
        &mam.init(&mut rand::thread_rng(), Some(seed())),
        Mode::Restricted,
        Some("PASSWORD"),
    )?;
    let message = mam.create_text(&state, "SECRET")?;
    mam.attach(&message).await?;

    let err = mam
        .fetch_single(&message.root, Mode::Restricted, None)
        .await
        .unwrap_err();
    assert!(matches!(err, MamError::MissingSideKey));

    // A wrong key looks somewhere else entirely.
    let elsewhere = mam
        .fetch_single(&message.root, Mode::Restricted, Some("GUESS"))
        .await?;
    assert!(elsewhere.is_empty());

    // At the real address it fails authentication.
    let err = mam
        .fetch_at(&message.address, &message.root, Mode::Restricted, Some("GUESS"))
        .await
        .unwrap_err();
    assert!(matches!(err, MamError::ProtocolViolation(_)));

    let result = mam
        .fetch_single(&message.root, Mode::Restricted, Some("PASSWORD"))
        .await?;
    assert_eq!(decode_str(&result.messages[0].payload)?, "SECRET");
    Ok(())
}

#[tokio::test]
async fn restricted_mode_without_key_is_rejected() {
    let mam = Mam::new(MemoryLedger::new(), config());
    let state = mam.init(&mut rand::thread_rng(), Some(seed()));

    let err = mam.change_mode(&state, Mode::Restricted, None).unwrap_err();
    assert!(matches!(err, MamError::InvalidModeConfiguration(_)));
}

#[tokio::test]
async fn empty_fetch_is_not_an_error() -> Result<()> {
    let mam = Mam::new(MemoryLedger::new(), config());
    let state = mam.init(&mut rand::thread_rng(), Some(seed()));
    let root = state.current_root();

    for _ in 0..3 {
        let result = mam.fetch_single(&root, Mode::Public, None).await?;
        assert!(result.is_empty());
        assert_eq!(result.next_root, None);
    }

    mam.publish(&state, encode_str("LATE")).await?;
    let result = mam.fetch_single(&root, Mode::Public, None).await?;
    assert_eq!(result.messages.len(), 1);
    Ok(())
}

#[tokio::test]
async fn private_chain_is_followed_in_order() -> Result<()> {
    init_tracing();
    let mam = Mam::new(MemoryLedger::new(), config());
    let mut state = mam.change_mode(
        &mam.init(&mut rand::thread_rng(), Some(seed())),
        Mode::Private,
        None,
    )?;
    let first_root = state.current_root();

    for text in ["ONE", "TWO", "THREE"] {
        let (_, next) = mam.publish(&state, encode_str(text)).await?;
        state = next;
    }

    let mut seen = Vec::new();
    let result = mam
        .fetch_with(&first_root, Mode::Private, None, |m| {
            seen.push(decode_str(&m.payload).unwrap())
        })
        .await?;

    assert_eq!(seen, vec!["ONE", "TWO", "THREE"]);
    assert_eq!(result.messages.len(), 3);
    assert_eq!(result.next_root, Some(state.current_root()));

    // The address is public but the body is not.
    let err = mam.fetch(&first_root, Mode::Public, None).await.unwrap_err();
    assert!(matches!(err, MamError::ProtocolViolation(_)));
    Ok(())
}

#[tokio::test]
async fn walker_resumes_after_new_messages() -> Result<()> {
    let mam = Mam::new(MemoryLedger::new(), config());
    let state = mam.init(&mut rand::thread_rng(), Some(seed()));
    let (_, state) = mam.publish(&state, encode_str("A")).await?;

    let mut walker = mam.walk(&seed_root(), Mode::Public, None)?;
    assert!(walker.next().await?.is_some());
    assert!(walker.next().await?.is_none());

    mam.publish(&state, encode_str("B")).await?;
    let message = walker.next().await?.expect("message B");
    assert_eq!(decode_str(&message.payload)?, "B");
    Ok(())
}

fn seed_root() -> mam::Root {
    derive_root(&seed(), 0, SecurityLevel::Low)
}

#[tokio::test]
async fn per_message_side_key_override() -> Result<()> {
    let mam = Mam::new(MemoryLedger::new(), config());
    let state = mam.change_mode(
        &mam.init(&mut rand::thread_rng(), Some(seed())),
        Mode::Restricted,
        Some("PASSWORD"),
    )?;

    let first = mam.create_with_side_key(&state, encode_str("FIRST"), "OTHERKEY")?;
    mam.attach(&first).await?;
    let second = mam.create_text(&first.state, "SECOND")?;
    mam.attach(&second).await?;

    let with_other = mam
        .fetch_single(&first.root, Mode::Restricted, Some("OTHERKEY"))
        .await?;
    assert_eq!(decode_str(&with_other.messages[0].payload)?, "FIRST");
    assert!(mam
        .fetch_single(&first.root, Mode::Restricted, Some("PASSWORD"))
        .await?
        .is_empty());

    // The channel kept its own key.
    let with_own = mam
        .fetch_single(&second.root, Mode::Restricted, Some("PASSWORD"))
        .await?;
    assert_eq!(decode_str(&with_own.messages[0].payload)?, "SECOND");

    let public = mam.init(&mut rand::thread_rng(), Some(seed()));
    let err = mam
        .create_with_side_key(&public, encode_str("X"), "OTHERKEY")
        .unwrap_err();
    assert!(matches!(err, MamError::InvalidModeConfiguration(_)));
    Ok(())
}

#[tokio::test]
async fn transient_attach_failures_are_retried() -> Result<()> {
    let mam = Mam::new(MemoryLedger::new(), config());
    let state = mam.init(&mut rand::thread_rng(), Some(seed()));

    mam.ledger().fail_next_attaches(2);
    mam.publish(&state, encode_str("HELLO")).await?;

    mam.ledger().fail_next_attaches(3);
    let err = mam
        .publish(&state.advance()?, encode_str("AGAIN"))
        .await
        .unwrap_err();
    assert!(err.is_transient());
    assert!(matches!(err, MamError::TransientFailure { attempts: 3, .. }));
    Ok(())
}

#[tokio::test]
async fn poll_waits_for_late_visibility() -> Result<()> {
    let ledger = MemoryLedger::with_visibility_delay(Duration::from_millis(25));
    let mam = Mam::new(ledger, config());
    let state = mam.init(&mut rand::thread_rng(), Some(seed()));

    mam.publish(&state, encode_str("EVENTUALLY")).await?;
    assert!(mam
        .fetch_single(&state.current_root(), Mode::Public, None)
        .await?
        .is_empty());

    let result = mam.poll(&state.current_root(), Mode::Public, None).await?;
    assert_eq!(decode_str(&result.messages[0].payload)?, "EVENTUALLY");
    Ok(())
}

#[tokio::test]
async fn poll_gives_up_with_timeout() {
    let mam = Mam::new(MemoryLedger::new(), config());
    let state = mam.init(&mut rand::thread_rng(), Some(seed()));

    let err = mam
        .poll(&state.current_root(), Mode::Public, None)
        .await
        .unwrap_err();
    assert!(matches!(err, MamError::Timeout(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn resume_from_sqlite_matches_replay() -> Result<()> {
    init_tracing();
    let dir = TempDir::new()?;
    let path = dir.path().join("ledger.db");

    let receipt = {
        let mam = Mam::new(SqliteLedger::open(&path)?, config());
        let mut state = mam.change_mode(
            &mam.init(&mut rand::thread_rng(), Some(seed())),
            Mode::Restricted,
            Some("PASSWORD"),
        )?;
        let mut receipt = None;
        for i in 0..4 {
            let (r, next) = mam
                .publish_and_save(&state, encode_str(&format!("MSG{}", i)))
                .await?;
            state = next;
            receipt = Some(r);
        }
        receipt.expect("published")
    };

    let mam = Mam::new(SqliteLedger::open(&path)?, config());
    let resumed = mam.resume(seed()).await?.expect("saved cursor");
    let replayed = mam.replay(seed(), Mode::Restricted, Some("PASSWORD"), receipt.start)?;

    assert_eq!(resumed, replayed);
    assert_eq!(resumed.current_root(), receipt.next_root);

    // Continuing from the resumed state extends the same chain.
    mam.publish(&resumed, encode_str("MSG4")).await?;
    let all = mam
        .fetch(&seed_root(), Mode::Restricted, Some("PASSWORD"))
        .await?;
    let texts = all
        .messages
        .iter()
        .map(|m| decode_str(&m.payload))
        .collect::<mam::core::Result<Vec<_>>>()?;
    assert_eq!(texts, vec!["MSG0", "MSG1", "MSG2", "MSG3", "MSG4"]);
    Ok(())
}

#[tokio::test]
async fn resume_unknown_seed_is_none() -> Result<()> {
    let mam = Mam::new(MemoryLedger::new(), config());
    let state = mam.init(&mut rand::thread_rng(), Some(seed()));
    mam.save_cursor(&state).await?;

    assert!(mam.resume(Seed::new("ANOTHERSEED")?).await?.is_none());
    Ok(())
}
