//! # Member Repository
//!
//! Database operations for library members.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use libris_core::{CoreError, Member, MemberForm, MemberId};

pub(crate) const MEMBER_COLUMNS: &str = "id, name, email, phone, member_type, membership_date, active";

/// Repository for member database operations.
#[derive(Debug, Clone)]
pub struct MemberRepository {
    pool: SqlitePool,
}

impl MemberRepository {
    /// Creates a new MemberRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MemberRepository { pool }
    }

    /// Lists all members ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Member>> {
        let sql = format!("SELECT {MEMBER_COLUMNS} FROM members ORDER BY name COLLATE NOCASE, id");
        let members = sqlx::query_as::<_, Member>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = members.len(), "Listed members");
        Ok(members)
    }

    /// Gets a member by ID.
    pub async fn get_by_id(&self, id: MemberId) -> DbResult<Option<Member>> {
        let sql = format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = ?1");
        let member = sqlx::query_as::<_, Member>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(member)
    }

    /// Registers a new active member, dated `now`.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Email already registered
    pub async fn insert(&self, form: &MemberForm, now: DateTime<Utc>) -> DbResult<Member> {
        debug!(email = %form.email, "Inserting member");

        let result = sqlx::query(
            r#"
            INSERT INTO members (name, email, phone, member_type, membership_date, active)
            VALUES (?1, ?2, ?3, ?4, ?5, 1)
            "#,
        )
        .bind(form.name.trim())
        .bind(form.email.trim())
        .bind(form.phone.trim())
        .bind(form.member_type)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_email(e.into(), &form.email))?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Member", id))
    }

    /// Updates contact details and member type.
    ///
    /// Membership date and the active flag are not part of the form and
    /// stay as they are.
    pub async fn update(&self, id: MemberId, form: &MemberForm) -> DbResult<Member> {
        debug!(id = %id, "Updating member");

        let result = sqlx::query(
            r#"
            UPDATE members SET
                name = ?2,
                email = ?3,
                phone = ?4,
                member_type = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(form.name.trim())
        .bind(form.email.trim())
        .bind(form.phone.trim())
        .bind(form.member_type)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_email(e.into(), &form.email))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Member", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Member", id))
    }

    /// Activates or deactivates a member. Inactive members cannot borrow.
    pub async fn set_active(&self, id: MemberId, active: bool) -> DbResult<()> {
        debug!(id = %id, active = active, "Setting member active flag");

        let result = sqlx::query("UPDATE members SET active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Member", id));
        }

        Ok(())
    }

    /// Deletes a member and their closed loan history.
    ///
    /// ## Errors
    /// * `DbError::Rule(CoreError::MemberHasActiveLoans)` while any book is
    ///   still out with the member
    /// * `DbError::NotFound` for an unknown id
    pub async fn delete(&self, id: MemberId) -> DbResult<()> {
        debug!(id = %id, "Deleting member");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let open_loans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions WHERE member_id = ?1 AND return_date IS NULL",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if open_loans > 0 {
            return Err(CoreError::MemberHasActiveLoans {
                id,
                count: open_loans,
            }
            .into());
        }

        sqlx::query("DELETE FROM transactions WHERE member_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM members WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Member", id));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Number of members allowed to borrow.
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members WHERE active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Fills in the offending email on a unique violation.
fn unique_email(err: DbError, email: &str) -> DbError {
    match err {
        DbError::UniqueViolation { .. } => DbError::duplicate("email", email.trim()),
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use libris_core::MemberType;

    async fn setup() -> MemberRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.members()
    }

    fn form(name: &str, email: &str, member_type: MemberType) -> MemberForm {
        MemberForm {
            name: name.to_string(),
            email: email.to_string(),
            phone: "555-0100".to_string(),
            member_type,
        }
    }

    #[tokio::test]
    async fn test_insert_defaults_to_active() {
        let repo = setup().await;
        let member = repo
            .insert(&form("Alice Smith", "alice@uni.edu", MemberType::Faculty), Utc::now())
            .await
            .unwrap();

        assert!(member.active);
        assert_eq!(member.member_type, MemberType::Faculty);
        assert_eq!(repo.count_active().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = setup().await;
        let now = Utc::now();
        repo.insert(&form("Alice", "alice@uni.edu", MemberType::Student), now)
            .await
            .unwrap();

        let err = repo
            .insert(&form("Alice Again", "alice@uni.edu", MemberType::Student), now)
            .await
            .unwrap_err();
        assert!(
            matches!(err, DbError::UniqueViolation { ref field, ref value } if field == "email" && value == "alice@uni.edu")
        );
    }

    #[tokio::test]
    async fn test_update_keeps_membership_date() {
        let repo = setup().await;
        let member = repo
            .insert(&form("Bob", "bob@uni.edu", MemberType::Student), Utc::now())
            .await
            .unwrap();

        let updated = repo
            .update(member.id, &form("Bob Jones", "bob@uni.edu", MemberType::Staff))
            .await
            .unwrap();
        assert_eq!(updated.name, "Bob Jones");
        assert_eq!(updated.member_type, MemberType::Staff);
        assert_eq!(updated.membership_date, member.membership_date);
    }

    #[tokio::test]
    async fn test_deactivate_and_delete() {
        let repo = setup().await;
        let member = repo
            .insert(&form("Carol", "carol@uni.edu", MemberType::Student), Utc::now())
            .await
            .unwrap();

        repo.set_active(member.id, false).await.unwrap();
        assert_eq!(repo.count_active().await.unwrap(), 0);
        assert!(repo.list().await.unwrap().len() == 1);

        repo.delete(member.id).await.unwrap();
        assert!(repo.get_by_id(member.id).await.unwrap().is_none());
        assert!(matches!(
            repo.update(member.id, &MemberForm::default()).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
