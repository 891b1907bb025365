//! Utility macros for reducing boilerplate

/// Macro to implement `FromRef<AppState>` for state extractors.
///
/// Lets handlers take just the piece of state they need.
///
/// # Example
/// ```ignore
/// impl_from_ref!(Arc<SessionStore>, sessions);
/// // Expands to:
/// impl axum::extract::FromRef<AppState> for Arc<SessionStore> {
///     fn from_ref(state: &AppState) -> Self {
///         state.sessions.clone()
///     }
/// }
/// ```
#[macro_export]
macro_rules! impl_from_ref {
    ($type:ty, $field:ident) => {
        impl axum::extract::FromRef<$crate::state::AppState> for $type {
            fn from_ref(state: &$crate::state::AppState) -> Self {
                state.$field.clone()
            }
        }
    };
}
