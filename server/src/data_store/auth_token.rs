use crate::cli::CliAuthTokenKey;
use crate::data_store::models::User;
use crate::data_store::{StoreError, UserId};

/// Name of the user group whose members get the [AccessRole::Manager] role.
pub const MANAGER_GROUP_NAME: &str = "Gestor de Eventos";

/// Authorization token for authorizing access to the data_store on behalf of a specific user
///
/// The AuthToken holds the id of the authenticated user and the list of [AccessRole]s derived from
/// the user's account. These imply specific [Privilege]s.
///
/// This structure is our main protection against accidental unauthorized-access bugs: All
/// data_store access functions require an AuthToken and check it for the required privilege. An
/// AuthToken can only be created by
/// [crate::data_store::SalasStoreFacade::get_auth_token_for_session], based on the user id in a
/// client's session, and in unittests.
///
/// For user-independent administration (by the command line interface), a GlobalAuthToken is
/// required instead.
#[derive(Debug, Clone)]
pub struct AuthToken {
    user_id: UserId,
    roles: Vec<AccessRole>,
}

impl AuthToken {
    /// Create a new AuthToken for a client session.
    ///
    /// This function must only be used by implementations of
    /// [crate::data_store::SalasStoreFacade::get_auth_token_for_session] after checking that the
    /// session's user exists and is active.
    pub(super) fn create_for_session(user_id: UserId, roles: Vec<AccessRole>) -> Self {
        AuthToken { user_id, roles }
    }

    #[cfg(test)]
    pub(crate) fn create_for_test(user_id: UserId, roles: Vec<AccessRole>) -> Self {
        AuthToken { user_id, roles }
    }

    /// Id of the user this token has been issued for. Used as creator of events and owner of notes.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Check if the AuthToken authorizes for the given `privilege`.
    ///
    /// The actual authorization check is delegated to [Privilege::qualifying_roles], by checking if
    /// any of the qualifying roles is contained in the AuthToken.
    pub fn has_privilege(&self, privilege: Privilege) -> bool {
        privilege
            .qualifying_roles()
            .iter()
            .any(|role| self.roles.contains(role))
    }

    /// Check if the AuthToken authorizes for the given `privilege`. If not, return an appropriate
    /// PermissionDenied error.
    pub fn check_privilege(&self, privilege: Privilege) -> Result<(), StoreError> {
        if self.has_privilege(privilege) {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied {
                required_privilege: privilege,
            })
        }
    }

    pub fn roles(&self) -> &[AccessRole] {
        &self.roles
    }
}

/// Authorization token for user-independent administrative actions (user management)
///
/// A GlobalAuthToken can only be created by cli functions, which need to present a
/// [CliAuthTokenKey].
pub struct GlobalAuthToken {
    roles: Vec<AccessRole>,
}

impl GlobalAuthToken {
    pub(crate) fn create_for_cli(_key: &CliAuthTokenKey) -> Self {
        GlobalAuthToken {
            roles: vec![AccessRole::Admin],
        }
    }

    #[cfg(test)]
    pub(crate) fn create_for_test() -> Self {
        GlobalAuthToken {
            roles: vec![AccessRole::Admin],
        }
    }

    pub fn check_privilege(&self, privilege: Privilege) -> Result<(), StoreError> {
        if privilege
            .qualifying_roles()
            .iter()
            .any(|role| self.roles.contains(role))
        {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied {
                required_privilege: privilege,
            })
        }
    }
}

/// Possible roles of an authenticated user.
///
/// Each role qualifies for a set of [Privilege]s. See [Privilege::qualifying_roles].
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Clone, Copy)]
pub enum AccessRole {
    User,
    Manager,
    Admin,
}

impl AccessRole {
    pub fn name(&self) -> &'static str {
        match self {
            AccessRole::User => "Usuario",
            AccessRole::Manager => "Gestor de Eventos",
            AccessRole::Admin => "Administrador",
        }
    }

    /// Derive the access roles of a user from the user's flags and group memberships.
    ///
    /// Inactive users don't get any role.
    pub fn roles_for_user(user: &User, groups: &[String]) -> Vec<AccessRole> {
        if !user.is_active {
            return vec![];
        }
        let mut roles = vec![AccessRole::User];
        if groups.iter().any(|g| g == MANAGER_GROUP_NAME) {
            roles.push(AccessRole::Manager);
        }
        if user.is_superuser || user.is_staff {
            roles.push(AccessRole::Admin);
        }
        roles
    }
}

/// Enum of available authorization privileges.
///
/// Each data_store action and web endpoint typically requires a single privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    ShowEvents,
    ManageEvents,
    ShowDashboard,
    FinishEvents,
    ShowStatistics,
    ManageNotes,
    PrintSchedule,
    ManageRooms,
    ManageUsers,
}

impl Privilege {
    /// Get the list of user [AccessRole]s that qualify for this privilege. Each returned role is
    /// individually sufficient for the privilege.
    ///
    /// This is function is our source of truth for authorization!
    /// It is also used to inform the user about the roles they would need for a specific action.
    pub fn qualifying_roles(&self) -> &'static [AccessRole] {
        match self {
            Privilege::ShowEvents => &[AccessRole::User, AccessRole::Manager, AccessRole::Admin],
            Privilege::ManageEvents => &[AccessRole::Manager, AccessRole::Admin],
            Privilege::ShowDashboard => &[AccessRole::Admin],
            Privilege::FinishEvents => &[AccessRole::Admin],
            Privilege::ShowStatistics => &[AccessRole::Admin],
            Privilege::ManageNotes => &[AccessRole::Admin],
            Privilege::PrintSchedule => &[AccessRole::Admin],
            Privilege::ManageRooms => &[AccessRole::Admin],
            Privilege::ManageUsers => &[AccessRole::Admin],
        }
    }
}
