/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// Closed set of user roles. Stored as the `user_role` Postgres enum.
///
/// Scope resolution matches on this exhaustively, so a new role cannot be
/// added without deciding what it may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    ClassAdmin,
    User,
}

/// Kind of uploaded resource. Stored as the `resource_type` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "resource_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Course,
    Exam,
    TpExercise,
    Project,
    Presentation,
    Report,
    Other,
}

/// Moderation state of a resource. Transitions pending -> approved/rejected
/// once; repeating the same transition is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "resource_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Pending,
    Approved,
    Rejected,
}

/// Activity kinds tracked for best-effort analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "activity_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Search,
    Download,
    FieldView,
    ModuleView,
}
