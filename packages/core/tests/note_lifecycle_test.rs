//! Note Lifecycle Surface Tests
//!
//! End-to-end flows through the public service surface: authenticating,
//! creating, editing, toggling through every category, emptying the trash,
//! and reopening the database file with a fresh service. These exercise
//! the same paths an API layer would drive, with the passthrough cipher
//! and a static token table standing in for the real collaborators.

#[cfg(test)]
mod note_lifecycle_tests {
    use anyhow::Result;
    use notegrid_core::db::DatabaseService;
    use notegrid_core::models::{NoteCategory, NoteColor, NoteDraft, NotePatch};
    use notegrid_core::services::{NoteService, PassthroughCipher, StaticTokenAuthenticator};
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .try_init();
    }

    async fn open_service(db_path: PathBuf) -> Result<NoteService> {
        let db = Arc::new(DatabaseService::new(db_path).await?);
        let auth = StaticTokenAuthenticator::new()
            .with_token("alice-token", "alice")
            .with_token("bob-token", "bob");
        Ok(NoteService::new(
            db,
            Arc::new(PassthroughCipher),
            Arc::new(auth),
        ))
    }

    async fn create_test_service() -> Result<(NoteService, TempDir)> {
        init_tracing();
        let temp_dir = TempDir::new()?;
        let service = open_service(temp_dir.path().join("notes.db")).await?;
        Ok((service, temp_dir))
    }

    #[tokio::test]
    async fn test_full_note_lifecycle() -> Result<()> {
        let (service, _temp) = create_test_service().await?;

        let owner = service.authenticate("alice-token").await?;
        assert_eq!(owner, "alice");

        // Draft a shopping note
        let note = service
            .create_note(
                &owner,
                NoteDraft::default()
                    .with_title("Groceries".to_string())
                    .with_content("eggs, flour".to_string())
                    .with_labels(vec!["errands".to_string()])
                    .with_color(NoteColor::Yellow),
            )
            .await?;
        assert_eq!(note.rank, 0);
        assert_eq!(note.category, NoteCategory::Regular);

        // Edit the list
        let note = service
            .update_note(
                &owner,
                &note.id,
                NotePatch::default().with_content("eggs, flour, milk".to_string()),
            )
            .await?;
        assert_eq!(note.content, "eggs, flour, milk");
        assert!(note.modified_at >= note.created_at);

        // Pin it for the week, then archive it once done
        let note = service.toggle_pin(&owner, &note.id).await?;
        assert_eq!(note.category, NoteCategory::Pinned);
        let note = service.toggle_archive(&owner, &note.id).await?;
        assert_eq!(note.category, NoteCategory::Archived);

        // Into the trash, briefly out, then back in and purged
        let note = service.toggle_delete(&owner, &note.id).await?;
        assert_eq!(note.category, NoteCategory::Deleted);
        let note = service.toggle_delete(&owner, &note.id).await?;
        assert_eq!(note.category, NoteCategory::Regular);
        let note = service.toggle_delete(&owner, &note.id).await?;

        service.purge_note(&owner, &note.id).await?;
        let err = service.fetch_note(&owner, &note.id).await.unwrap_err();
        assert_eq!(err.kind(), "notFound");

        Ok(())
    }

    #[tokio::test]
    async fn test_board_view_ordering_survives_edits() -> Result<()> {
        let (service, _temp) = create_test_service().await?;

        let mut ids = Vec::new();
        for title in ["plans", "ideas", "journal"] {
            let note = service
                .create_note("alice", NoteDraft::default().with_title(title.to_string()))
                .await?;
            ids.push(note.id);
        }
        // Board order is newest-first: journal, ideas, plans

        // Editing a note's text never moves it
        service
            .update_note(
                "alice",
                &ids[0],
                NotePatch::default().with_title("plans v2".to_string()),
            )
            .await?;

        let titles: Vec<String> = service
            .fetch_by_category("alice", NoteCategory::Regular)
            .await?
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["journal", "ideas", "plans v2"]);

        // Dragging rearranges exactly as requested
        let batch = vec![ids[0].clone(), ids[2].clone(), ids[1].clone()];
        let reordered = service
            .reorder("alice", NoteCategory::Regular, &batch)
            .await?;
        let titles: Vec<&str> = reordered.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["plans v2", "journal", "ideas"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_empty_trash_flow() -> Result<()> {
        let (service, _temp) = create_test_service().await?;

        let keep = service
            .create_note("alice", NoteDraft::default().with_title("keep".to_string()))
            .await?;
        for title in ["old 1", "old 2", "old 3"] {
            let note = service
                .create_note("alice", NoteDraft::default().with_title(title.to_string()))
                .await?;
            service.toggle_delete("alice", &note.id).await?;
        }

        let counts = service.category_counts("alice").await?;
        assert_eq!(counts.deleted, 3);

        let removed = service.empty_trash("alice").await?;
        assert_eq!(removed, 3);

        let counts = service.category_counts("alice").await?;
        assert_eq!(counts.deleted, 0);
        assert_eq!(counts.regular, 1);
        assert!(service.fetch_note("alice", &keep.id).await.is_ok());

        // Emptying an already-empty trash is a quiet no-op
        assert_eq!(service.empty_trash("alice").await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_users_cannot_see_each_other() -> Result<()> {
        let (service, _temp) = create_test_service().await?;

        let alice_note = service
            .create_note("alice", NoteDraft::default().with_title("private".to_string()))
            .await?;

        let bob = service.authenticate("bob-token").await?;
        let err = service.fetch_note(&bob, &alice_note.id).await.unwrap_err();
        assert_eq!(err.kind(), "accessDenied");

        assert!(service
            .fetch_by_category(&bob, NoteCategory::Regular)
            .await?
            .is_empty());
        assert_eq!(service.category_counts(&bob).await?.total(), 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_error_surface_for_client_mistakes() -> Result<()> {
        let (service, _temp) = create_test_service().await?;

        let err = service.authenticate("stale-token").await.unwrap_err();
        assert_eq!(err.kind(), "unauthenticated");

        let err = service
            .fetch_note("alice", "not-a-uuid")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalidIdentifier");

        let ghost = uuid::Uuid::new_v4().to_string();
        let err = service.fetch_note("alice", &ghost).await.unwrap_err();
        assert_eq!(err.kind(), "notFound");
        // Domain errors explain themselves to the user
        assert!(err.user_message().contains(&ghost));

        let note = service
            .create_note("alice", NoteDraft::default().with_title("live".to_string()))
            .await?;
        let err = service.purge_note("alice", &note.id).await.unwrap_err();
        assert_eq!(err.kind(), "preconditionFailed");
        assert!(err.user_message().contains("must be soft-deleted first"));

        Ok(())
    }

    #[tokio::test]
    async fn test_state_survives_service_restart() -> Result<()> {
        init_tracing();
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("notes.db");

        let first = open_service(db_path.clone()).await?;
        let pinned = first
            .create_note(
                "alice",
                NoteDraft::default()
                    .with_title("pinned".to_string())
                    .with_labels(vec!["a".to_string(), "b".to_string()])
                    .with_category(NoteCategory::Pinned),
            )
            .await?;
        let regular = first
            .create_note("alice", NoteDraft::default().with_title("regular".to_string()))
            .await?;
        drop(first);

        let second = open_service(db_path).await?;
        let restored = second.fetch_note("alice", &pinned.id).await?;
        assert_eq!(restored, pinned);

        assert_eq!(
            second
                .fetch_by_category("alice", NoteCategory::Regular)
                .await?
                .iter()
                .map(|n| n.id.as_str())
                .collect::<Vec<_>>(),
            vec![regular.id.as_str()]
        );

        Ok(())
    }
}
