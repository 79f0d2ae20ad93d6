use tracing::error;

use crate::error::AppError;
use crate::models::Profile;
use crate::supabase::SupabaseClient;

/// Profile of the signed-in user, with the server's own error text when the
/// profile API refuses.
pub async fn load_profile(backend: &dyn SupabaseClient) -> Result<Profile, AppError> {
    backend.fetch_profile().await.map_err(|e| match e {
        AppError::Backend { status, message, .. } => {
            error!("Profile request failed ({}): {}", status, message);
            AppError::failed("Error", message)
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supabase::InMemorySupabase;

    #[tokio::test]
    async fn test_profile_needs_session() {
        let backend = InMemorySupabase::new();
        let err = load_profile(&backend).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_profile_of_signed_in_user() {
        let backend = InMemorySupabase::new();
        let user = backend.add_user("ana@opsclad.io", "secret");
        backend.add_profile(
            &user.id,
            Profile {
                name: "Ana".to_string(),
                email: "ana@opsclad.io".to_string(),
                employee_id: Some("E-1".to_string()),
                birthday: Some("1990-12-24".to_string()),
                role: Some("engineer".to_string()),
                username: None,
            },
        );
        let session = backend
            .sign_in_with_password("ana@opsclad.io", "secret")
            .await
            .unwrap();
        backend.set_access_token(Some(session.access_token));

        let profile = load_profile(&backend).await.unwrap();
        assert_eq!(profile.employee_id.as_deref(), Some("E-1"));
        assert_eq!(profile.role.as_deref(), Some("engineer"));
    }
}
