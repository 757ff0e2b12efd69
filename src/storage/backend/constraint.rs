//! 数据库约束错误识别
//!
//! slug 唯一索引冲突需要与其他写入错误区分：前者触发换一个 slug 重试，
//! 后者直接向上传播。hit 外键冲突说明链接已被删除，按 NotFound 处理。

use sea_orm::{DbErr, SqlErr};

const UNIQUE_CODES: &[&str] = &[
    // MySQL duplicate entry
    "1062", "23000",
    // PostgreSQL unique_violation
    "23505",
    // SQLite SQLITE_CONSTRAINT_UNIQUE / PRIMARYKEY
    "2067", "1555",
];

const FOREIGN_KEY_CODES: &[&str] = &[
    // MySQL ER_NO_REFERENCED_ROW_2
    "1452",
    // PostgreSQL foreign_key_violation
    "23503",
    // SQLite SQLITE_CONSTRAINT_FOREIGNKEY
    "787",
];

/// 判断写入错误是否为唯一约束冲突
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
        || runtime_error_matches(err, UNIQUE_CODES, is_unique_violation_message)
}

/// 判断写入错误是否为外键约束冲突
pub fn is_foreign_key_violation(err: &DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(SqlErr::ForeignKeyConstraintViolation(_))
    ) || runtime_error_matches(err, FOREIGN_KEY_CODES, is_foreign_key_violation_message)
}

fn runtime_error_matches(err: &DbErr, codes: &[&str], by_message: fn(&str) -> bool) -> bool {
    use sea_orm::error::RuntimeErr;

    let runtime_err = match err {
        DbErr::Exec(runtime_err) | DbErr::Query(runtime_err) => runtime_err,
        _ => return false,
    };

    match runtime_err {
        RuntimeErr::SqlxError(sqlx_err) => {
            use std::ops::Deref;
            if let Some(db_err) = sqlx_err.deref().as_database_error()
                && let Some(code) = db_err.code()
            {
                return codes.iter().any(|c| code == *c);
            }
            by_message(&sqlx_err.to_string().to_lowercase())
        }
        RuntimeErr::Internal(msg) => by_message(&msg.to_lowercase()),
        #[allow(unreachable_patterns)]
        _ => false,
    }
}

/// 通过错误消息判断（回退方案）
fn is_unique_violation_message(err_str: &str) -> bool {
    err_str.contains("unique constraint")
        || err_str.contains("duplicate entry")
        || err_str.contains("duplicate key")
}

fn is_foreign_key_violation_message(err_str: &str) -> bool {
    err_str.contains("foreign key constraint") || err_str.contains("violates foreign key")
}
