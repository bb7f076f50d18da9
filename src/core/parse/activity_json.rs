// FileMill - core/parse/activity_json.rs
//
// User-activity JSON parser. The document is walked as a serde_json::Value
// tree rather than deserialised into structs: every record failure must be
// reported with its collection index, and all failures aggregate into a
// single validation error instead of stopping at the first.

use crate::core::model::{Session, User, UserActivity};
use crate::core::parse::{read_file, ParseOutcome};
use serde_json::Value;
use std::path::Path;

/// Parse a user-activity JSON document.
///
/// The root must be an object with `usuarios` and `sesiones` arrays. Any
/// per-record failure is collected as `<collection>[<index>]: reason`; the
/// file fails as a whole when at least one record is invalid.
pub fn parse(path: &Path) -> ParseOutcome<UserActivity> {
    let content = match read_file(path) {
        Ok(c) => c,
        Err(reason) => return ParseOutcome::Error(reason),
    };

    let root: Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => return ParseOutcome::Error(format!("Invalid JSON: {e}")),
    };

    let Some(object) = root.as_object() else {
        return ParseOutcome::Error(
            "JSON validation failed: root must be an object".to_string(),
        );
    };

    let mut reasons: Vec<String> = Vec::new();
    let mut activity = UserActivity::default();

    match object.get("usuarios") {
        Some(Value::Array(users)) => {
            for (idx, value) in users.iter().enumerate() {
                match validate_user(value) {
                    Ok(user) => activity.users.push(user),
                    Err(reason) => reasons.push(format!("usuarios[{idx}]: {reason}")),
                }
            }
        }
        Some(_) => reasons.push("'usuarios' must be an array".to_string()),
        None => reasons.push("missing required array 'usuarios'".to_string()),
    }

    match object.get("sesiones") {
        Some(Value::Array(sessions)) => {
            for (idx, value) in sessions.iter().enumerate() {
                match validate_session(value) {
                    Ok(session) => activity.sessions.push(session),
                    Err(reason) => reasons.push(format!("sesiones[{idx}]: {reason}")),
                }
            }
        }
        Some(_) => reasons.push("'sesiones' must be an array".to_string()),
        None => reasons.push("missing required array 'sesiones'".to_string()),
    }

    if !reasons.is_empty() {
        return ParseOutcome::Error(format!(
            "JSON validation failed: {}",
            reasons.join("; ")
        ));
    }

    tracing::debug!(
        file = %path.display(),
        users = activity.users.len(),
        sessions = activity.sessions.len(),
        "Activity JSON parsed"
    );
    ParseOutcome::Ok(activity)
}

/// Validate one user record.
fn validate_user(value: &Value) -> Result<User, String> {
    let obj = value.as_object().ok_or("record must be an object")?;

    let id = obj
        .get("id")
        .and_then(Value::as_i64)
        .ok_or("'id' must be an integer")?;
    let name = obj
        .get("nombre")
        .and_then(Value::as_str)
        .ok_or("'nombre' must be a string")?
        .to_string();
    let email = obj
        .get("email")
        .and_then(Value::as_str)
        .ok_or("'email' must be a string")?
        .to_string();
    let active = obj
        .get("activo")
        .and_then(Value::as_bool)
        .ok_or("'activo' must be a boolean")?;

    let last_access = match obj.get("ultimo_acceso") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => return Err("'ultimo_acceso' must be a string".to_string()),
    };

    Ok(User {
        id,
        name,
        email,
        active,
        last_access,
    })
}

/// Validate one session record. Optional fields keep their natural types;
/// `acciones` is coerced to an empty list when absent or not a list.
fn validate_session(value: &Value) -> Result<Session, String> {
    let obj = value.as_object().ok_or("record must be an object")?;

    let user_id = obj
        .get("usuario_id")
        .and_then(Value::as_i64)
        .ok_or("'usuario_id' must be an integer")?;

    let start = match obj.get("inicio") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => return Err("'inicio' must be a string".to_string()),
    };

    let duration_seconds = match obj.get("duracion_segundos") {
        None | Some(Value::Null) => None,
        Some(v) => Some(
            v.as_f64()
                .ok_or("'duracion_segundos' must be a number")?,
        ),
    };

    let pages_visited = match obj.get("paginas_visitadas") {
        None | Some(Value::Null) => None,
        Some(v) => Some(
            v.as_i64()
                .ok_or("'paginas_visitadas' must be an integer")?,
        ),
    };

    // Coercion, not validation: anything that is not a list becomes [].
    // Non-string members are dropped.
    let actions = obj
        .get("acciones")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(Session {
        user_id,
        start,
        duration_seconds,
        pages_visited,
        actions,
    })
}

// =============================================================================
// Tests
// =============================================================================
