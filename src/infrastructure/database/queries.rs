pub(super) const SELECT_DOCUMENTS: &str = r#"
    SELECT payload
    FROM documents
    WHERE collection = ?1
    ORDER BY seq DESC
"#;

pub(super) const SELECT_DOCUMENT: &str = r#"
    SELECT payload
    FROM documents
    WHERE collection = ?1 AND id = ?2
"#;

pub(super) const INSERT_DOCUMENT: &str = r#"
    INSERT INTO documents (collection, id, payload, created_at, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5)
"#;

pub(super) const UPDATE_DOCUMENT: &str = r#"
    UPDATE documents
    SET payload = ?3, updated_at = ?4
    WHERE collection = ?1 AND id = ?2
"#;

pub(super) const DELETE_DOCUMENT: &str = r#"
    DELETE FROM documents
    WHERE collection = ?1 AND id = ?2
"#;

pub(super) const COUNT_DOCUMENTS: &str = r#"
    SELECT COUNT(*) AS total
    FROM documents
    WHERE collection = ?1
"#;
