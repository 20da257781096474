//! Reorder Batch Tests
//!
//! Exercises the full-membership contract: a reorder batch must be a
//! permutation of exactly the partition's live ids, under the batch
//! ceiling, and is applied as one conditional bulk update or not at all.

#[cfg(test)]
mod tests {
    use crate::db::DatabaseService;
    use crate::models::time::MockTimeProvider;
    use crate::models::{Note, NoteCategory, NoteDraft};
    use crate::services::auth::StaticTokenAuthenticator;
    use crate::services::crypto::PassthroughCipher;
    use crate::services::error::NoteServiceError;
    use crate::services::note_service::{NoteService, NoteServiceConfig};
    use chrono::Duration;
    use std::sync::Arc;
    use tempfile::TempDir;
    use uuid::Uuid;

    async fn create_test_service() -> (NoteService, TempDir) {
        create_service_with_config(NoteServiceConfig::default()).await
    }

    async fn create_service_with_config(config: NoteServiceConfig) -> (NoteService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(DatabaseService::new(db_path).await.unwrap());

        let auth = StaticTokenAuthenticator::new().with_token("token-1", "u1");
        let service = NoteService::with_config(
            db,
            Arc::new(PassthroughCipher),
            Arc::new(auth),
            config,
        );

        (service, temp_dir)
    }

    /// Seed `n` notes for `owner` and return the partition in rank order
    async fn seed_regular(service: &NoteService, owner: &str, n: usize) -> Vec<Note> {
        for i in 0..n {
            service
                .create_note(owner, NoteDraft::default().with_title(format!("note-{}", i)))
                .await
                .unwrap();
        }
        service
            .fetch_by_category(owner, NoteCategory::Regular)
            .await
            .unwrap()
    }

    fn ids(notes: &[Note]) -> Vec<String> {
        notes.iter().map(|n| n.id.clone()).collect()
    }

    #[tokio::test]
    async fn test_reorder_applies_batch_positions() {
        let (service, _temp) = create_test_service().await;
        let notes = seed_regular(&service, "u1", 3).await;
        let (x, y, z) = (&notes[0], &notes[1], &notes[2]);

        let batch = vec![z.id.clone(), x.id.clone(), y.id.clone()];
        let reordered = service
            .reorder("u1", NoteCategory::Regular, &batch)
            .await
            .unwrap();

        assert_eq!(ids(&reordered), batch);
        assert_eq!(
            reordered.iter().map(|n| n.rank).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );

        let fetched = service
            .fetch_by_category("u1", NoteCategory::Regular)
            .await
            .unwrap();
        assert_eq!(ids(&fetched), batch);
    }

    #[tokio::test]
    async fn test_reorder_rejected_for_trash() {
        let (service, _temp) = create_test_service().await;
        let note = service
            .create_note("u1", NoteDraft::default().with_title("t".to_string()))
            .await
            .unwrap();
        service.toggle_delete("u1", &note.id).await.unwrap();

        let err = service
            .reorder("u1", NoteCategory::Deleted, &[note.id.clone()])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "invalidCategory");
        let trash = service
            .fetch_by_category("u1", NoteCategory::Deleted)
            .await
            .unwrap();
        assert_eq!(trash[0].rank, 0);
    }

    #[tokio::test]
    async fn test_reorder_rejects_duplicate_ids() {
        let (service, _temp) = create_test_service().await;
        let notes = seed_regular(&service, "u1", 2).await;
        let (a, b) = (&notes[0], &notes[1]);

        let err = service
            .reorder(
                "u1",
                NoteCategory::Regular,
                &[a.id.clone(), a.id.clone(), b.id.clone()],
            )
            .await
            .unwrap_err();

        match err {
            NoteServiceError::SetMismatch { duplicated, .. } => {
                assert_eq!(duplicated, vec![a.id.clone()]);
            }
            other => panic!("expected SetMismatch, got {:?}", other),
        }

        let unchanged = service
            .fetch_by_category("u1", NoteCategory::Regular)
            .await
            .unwrap();
        assert_eq!(ids(&unchanged), ids(&notes));
    }

    #[tokio::test]
    async fn test_reorder_rejects_oversized_batch() {
        let config = NoteServiceConfig {
            reorder_batch_limit: 2,
            ..NoteServiceConfig::default()
        };
        let (service, _temp) = create_service_with_config(config).await;

        let batch: Vec<String> = (0..3).map(|_| Uuid::new_v4().to_string()).collect();
        let err = service
            .reorder("u1", NoteCategory::Regular, &batch)
            .await
            .unwrap_err();

        match err {
            NoteServiceError::BatchTooLarge { size, limit } => {
                assert_eq!(size, 3);
                assert_eq!(limit, 2);
            }
            other => panic!("expected BatchTooLarge, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reorder_with_unknown_id_reports_missing() {
        let (service, _temp) = create_test_service().await;
        let notes = seed_regular(&service, "u1", 2).await;
        let ghost = Uuid::new_v4().to_string();

        let err = service
            .reorder(
                "u1",
                NoteCategory::Regular,
                &[notes[0].id.clone(), notes[1].id.clone(), ghost.clone()],
            )
            .await
            .unwrap_err();

        match err {
            NoteServiceError::SetMismatch { missing, unlisted, .. } => {
                assert_eq!(missing, vec![ghost]);
                assert!(unlisted.is_empty());
            }
            other => panic!("expected SetMismatch, got {:?}", other),
        }

        let unchanged = service
            .fetch_by_category("u1", NoteCategory::Regular)
            .await
            .unwrap();
        assert_eq!(ids(&unchanged), ids(&notes));
    }

    #[tokio::test]
    async fn test_reorder_omitting_live_note_reports_unlisted() {
        let (service, _temp) = create_test_service().await;
        let notes = seed_regular(&service, "u1", 2).await;

        let err = service
            .reorder("u1", NoteCategory::Regular, &[notes[0].id.clone()])
            .await
            .unwrap_err();

        match err {
            NoteServiceError::SetMismatch { missing, unlisted, .. } => {
                assert!(missing.is_empty());
                assert_eq!(unlisted, vec![notes[1].id.clone()]);
            }
            other => panic!("expected SetMismatch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reorder_cannot_capture_foreign_notes() {
        let (service, _temp) = create_test_service().await;
        let mine = seed_regular(&service, "u1", 1).await;
        let theirs = service
            .create_note("u2", NoteDraft::default().with_title("theirs".to_string()))
            .await
            .unwrap();

        let err = service
            .reorder(
                "u1",
                NoteCategory::Regular,
                &[mine[0].id.clone(), theirs.id.clone()],
            )
            .await
            .unwrap_err();

        match err {
            NoteServiceError::SetMismatch { missing, .. } => {
                assert_eq!(missing, vec![theirs.id.clone()]);
            }
            other => panic!("expected SetMismatch, got {:?}", other),
        }

        // The foreign note never moved
        let foreign = service.fetch_note("u2", &theirs.id).await.unwrap();
        assert_eq!(foreign.rank, 0);
    }

    #[tokio::test]
    async fn test_reorder_empty_partition_with_empty_batch() {
        let (service, _temp) = create_test_service().await;

        let result = service
            .reorder("u1", NoteCategory::Regular, &[])
            .await
            .unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_reorder_rejects_malformed_ids() {
        let (service, _temp) = create_test_service().await;

        let err = service
            .reorder("u1", NoteCategory::Regular, &["nope".to_string()])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "invalidIdentifier");
    }

    #[tokio::test]
    async fn test_reorder_never_bumps_modified_at() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(DatabaseService::new(db_path).await.unwrap());
        let clock = MockTimeProvider::new();
        let auth = StaticTokenAuthenticator::new().with_token("token-1", "u1");
        let service = NoteService::new(db, Arc::new(PassthroughCipher), Arc::new(auth))
            .with_time_provider(Arc::new(clock.clone()));

        let notes = seed_regular(&service, "u1", 3).await;
        let stamps: Vec<_> = notes.iter().map(|n| n.modified_at).collect();

        clock.advance(Duration::hours(3));
        let batch: Vec<String> = notes.iter().rev().map(|n| n.id.clone()).collect();
        let reordered = service
            .reorder("u1", NoteCategory::Regular, &batch)
            .await
            .unwrap();

        for note in &reordered {
            let original = notes.iter().position(|n| n.id == note.id).unwrap();
            assert_eq!(note.modified_at, stamps[original]);
        }
    }
}
