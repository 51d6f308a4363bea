use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;

/// Makes sure the configured first admin exists, is active and can log in with the configured password.
pub(crate) async fn ensure_admin(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_admin_password.is_empty() {
        tracing::warn!("FIRST_ADMIN_PASSWORD not configured; skipping admin creation");
        return Ok(());
    }

    let username = &admin.first_admin_username;
    let now = primitive_now_utc();

    if let Some(user) = repositories::users::find_by_username(state.db(), username).await? {
        let password_ok =
            security::verify_password(&admin.first_admin_password, &user.hashed_password)
                .unwrap_or(false);

        if password_ok && user.role == UserRole::Admin && user.is_active {
            tracing::info!(username = %username, "Default admin already up to date");
            return Ok(());
        }

        let hashed_password = if password_ok {
            None
        } else {
            Some(security::hash_password(&admin.first_admin_password)?)
        };

        repositories::users::update(
            state.db(),
            &user.id,
            repositories::users::UpdateUser {
                hashed_password,
                role: Some(UserRole::Admin),
                is_active: Some(true),
                updated_at: now,
            },
        )
        .await?;

        tracing::info!(username = %username, "Updated default admin");
        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_admin_password)?;
    repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            username,
            hashed_password,
            full_name: "School Admin",
            role: UserRole::Admin,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    tracing::info!(username = %username, "Created default admin");
    Ok(())
}
