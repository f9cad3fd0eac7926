use crate::error::AppError;

/// SQL fragments that have no business in a natural-language question.
/// Checked before anything touches the database layer.
const SQL_FRAGMENTS: [&str; 10] = [
    "drop table",
    "drop database",
    "delete from",
    "insert into",
    "update set",
    "alter table",
    "create table",
    "union select",
    "attach database",
    "pragma ",
];

pub fn check_question(question: &str) -> Result<(), AppError> {
    let lowered = question.to_lowercase();

    if lowered.contains(';') || lowered.contains("--") || lowered.contains("/*") {
        return Err(AppError::Input(
            "Question contains disallowed SQL syntax".to_string(),
        ));
    }

    for fragment in SQL_FRAGMENTS {
        if lowered.contains(fragment) {
            return Err(AppError::Input(
                "Question contains disallowed SQL syntax".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_questions_pass() {
        assert!(check_question("Who was absent most often last month?").is_ok());
        assert!(check_question("Show attendance for the IT department in a table").is_ok());
        assert!(check_question("من كان غائبًا هذا الشهر؟").is_ok());
    }

    #[test]
    fn sql_fragments_are_rejected() {
        assert!(check_question("'; DROP TABLE employees; --").is_err());
        assert!(check_question("list employees UNION SELECT * FROM sqlite_master").is_err());
        assert!(check_question("delete from attendance").is_err());
        assert!(check_question("anything; at all").is_err());
    }

    #[test]
    fn case_does_not_matter() {
        assert!(check_question("DrOp TaBlE attendance").is_err());
    }
}
