//! Account roles and the effective caller identity

use serde::{Deserialize, Serialize};

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Grower,
    Applicator,
    ApplicatorUser,
    Worker,
    SuperAdmin,
    SuperAdminUser,
}

impl Role {
    pub fn all() -> &'static [Role] {
        &[
            Role::Grower,
            Role::Applicator,
            Role::ApplicatorUser,
            Role::Worker,
            Role::SuperAdmin,
            Role::SuperAdminUser,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Grower => "GROWER",
            Role::Applicator => "APPLICATOR",
            Role::ApplicatorUser => "APPLICATOR_USER",
            Role::Worker => "WORKER",
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::SuperAdminUser => "SUPER_ADMIN_USER",
        }
    }

    /// Roles with platform-wide administrative rights
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::SuperAdminUser)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Role::all()
            .iter()
            .find(|r| r.as_str() == normalized)
            .copied()
            .ok_or_else(|| format!("Unknown role: {}", s))
    }
}

/// Onboarding state of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileStatus {
    #[default]
    Incomplete,
    Complete,
    Suspended,
}

impl ProfileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileStatus::Incomplete => "INCOMPLETE",
            ProfileStatus::Complete => "COMPLETE",
            ProfileStatus::Suspended => "SUSPENDED",
        }
    }
}

impl std::fmt::Display for ProfileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProfileStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INCOMPLETE" => Ok(ProfileStatus::Incomplete),
            "COMPLETE" => Ok(ProfileStatus::Complete),
            "SUSPENDED" => Ok(ProfileStatus::Suspended),
            _ => Err(format!("Unknown profile status: {}", s)),
        }
    }
}

/// The identity a service call runs as.
///
/// Applicator users act on behalf of the applicator that invited them; for
/// those callers `id`/`role` are the applicator's and `acting_user_id` keeps
/// the real account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveActor {
    pub id: i64,
    pub role: Role,
    pub is_delegated: bool,
    pub acting_user_id: i64,
}

impl EffectiveActor {
    /// An actor acting as itself
    pub fn direct(id: i64, role: Role) -> Self {
        Self {
            id,
            role,
            is_delegated: false,
            acting_user_id: id,
        }
    }

    /// An applicator user acting for `applicator_id`
    pub fn delegated(applicator_id: i64, acting_user_id: i64) -> Self {
        Self {
            id: applicator_id,
            role: Role::Applicator,
            is_delegated: true,
            acting_user_id,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!("worker".parse::<Role>().unwrap(), Role::Worker);
        assert_eq!(
            "applicator-user".parse::<Role>().unwrap(),
            Role::ApplicatorUser
        );
        assert_eq!("SUPER_ADMIN".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert!("pilot".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serializes_screaming_snake() {
        let json = serde_json::to_string(&Role::ApplicatorUser).unwrap();
        assert_eq!(json, "\"APPLICATOR_USER\"");
    }

    #[test]
    fn test_delegated_actor_keeps_acting_user() {
        let actor = EffectiveActor::delegated(5, 9);
        assert_eq!(actor.id, 5);
        assert_eq!(actor.role, Role::Applicator);
        assert!(actor.is_delegated);
        assert_eq!(actor.acting_user_id, 9);

        let direct = EffectiveActor::direct(3, Role::Grower);
        assert!(!direct.is_delegated);
        assert_eq!(direct.acting_user_id, 3);
    }
}
