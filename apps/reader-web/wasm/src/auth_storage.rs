//! Auth session persisted in localStorage

use reader_types::{AuthSession, AUTH_STORAGE_KEY};
use wasm_bindgen::prelude::*;
use web_sys::Storage;

fn storage() -> Result<Storage, JsValue> {
    let window = web_sys::window().ok_or("No window")?;
    window.local_storage()?.ok_or_else(|| "No localStorage".into())
}

/// Load the stored session. Missing or unreadable entries give an empty
/// session; the result is always hydrated.
pub fn load_session() -> Result<AuthSession, JsValue> {
    let stored = storage()?.get_item(AUTH_STORAGE_KEY)?;
    let mut session = match stored {
        Some(json) => AuthSession::from_persisted_json(&json).unwrap_or_else(|e| {
            web_sys::console::warn_1(&format!("Discarding stored session: {}", e).into());
            AuthSession::new()
        }),
        None => AuthSession::new(),
    };
    session.mark_hydrated();
    Ok(session)
}

pub fn save_session(session: &AuthSession) -> Result<(), JsValue> {
    let json = session
        .to_persisted_json()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    storage()?.set_item(AUTH_STORAGE_KEY, &json)
}

/// Current session as a JS object (`{ user, accessToken, refreshToken }`)
#[wasm_bindgen(js_name = getAuthSession)]
pub fn get_auth_session() -> Result<JsValue, JsValue> {
    let session = load_session()?;
    serde_wasm_bindgen::to_value(&session)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Store user and tokens after sign-in. `user` is the profile object
/// returned by the backend.
#[wasm_bindgen(js_name = setAuthSession)]
pub fn set_auth_session(
    user: JsValue,
    access_token: &str,
    refresh_token: &str,
) -> Result<(), JsValue> {
    let user = serde_wasm_bindgen::from_value(user)
        .map_err(|e| JsValue::from_str(&format!("Invalid user: {}", e)))?;
    let mut session = load_session()?;
    session.set_session(user, access_token, refresh_token);
    save_session(&session)
}

/// Replace tokens after a refresh; the stored refresh token is kept when
/// none is given
#[wasm_bindgen(js_name = setAuthTokens)]
pub fn set_auth_tokens(access_token: &str, refresh_token: Option<String>) -> Result<(), JsValue> {
    let mut session = load_session()?;
    session.set_tokens(access_token, refresh_token);
    save_session(&session)
}

#[wasm_bindgen(js_name = clearAuthSession)]
pub fn clear_auth_session() -> Result<(), JsValue> {
    let mut session = load_session()?;
    session.clear();
    save_session(&session)
}
