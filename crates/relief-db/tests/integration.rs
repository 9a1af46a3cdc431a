use relief_db::{create_pool, run_migrations, DbRuntimeSettings};

#[test]
fn pooled_connections_share_a_file_database() {
    let dir = tempfile::tempdir().expect("failed to create tempdir");
    let path = dir.path().join("relief.db");
    let pool = create_pool(path.to_str().unwrap(), DbRuntimeSettings::default())
        .expect("failed to create pool");

    {
        let conn = pool.get().expect("failed to get connection");
        let applied = run_migrations(&conn).expect("failed to run migrations");
        assert_eq!(applied, 4);
    }

    let writer = pool.get().expect("failed to get writer");
    let reader = pool.get().expect("failed to get reader");

    writer
        .execute(
            "INSERT INTO reports (id, disaster_id, author, content, created_at)
             VALUES ('r1', 'd1', 'citizen1', 'roads blocked', '2024-01-01T00:00:00Z')",
            [],
        )
        .expect("failed to insert report");

    let status: String = reader
        .query_row(
            "SELECT verification_status FROM reports WHERE id = 'r1'",
            [],
            |row| row.get(0),
        )
        .expect("reader should see committed row");
    assert_eq!(status, "pending");
}

#[test]
fn unknown_verification_status_is_rejected() {
    let dir = tempfile::tempdir().expect("failed to create tempdir");
    let path = dir.path().join("relief.db");
    let pool = create_pool(path.to_str().unwrap(), DbRuntimeSettings::default())
        .expect("failed to create pool");
    let conn = pool.get().expect("failed to get connection");
    run_migrations(&conn).expect("failed to run migrations");

    let result = conn.execute(
        "INSERT INTO reports (id, disaster_id, author, content, verification_status, created_at)
         VALUES ('r1', 'd1', 'citizen1', 'x', 'verified', '2024-01-01T00:00:00Z')",
        [],
    );
    assert!(result.is_err());
}
