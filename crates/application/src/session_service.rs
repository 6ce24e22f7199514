use std::collections::BTreeSet;
use std::sync::Arc;

use campus_core::{AppError, AppResult, UserIdentity};
use campus_domain::{Locale, Permission, Role, RoleRegistry, Session};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::session_ports::{SESSION_RECORD_VERSION, SessionRecord, SessionRecordStore};

/// Read-only view of the current authentication state.
///
/// Snapshots are values; consumers never mutate the session through one.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    session: Option<Session>,
    is_authenticated: bool,
}

impl SessionSnapshot {
    fn signed_out() -> Self {
        Self {
            session: None,
            is_authenticated: false,
        }
    }

    fn signed_in(session: Session) -> Self {
        Self {
            session: Some(session),
            is_authenticated: true,
        }
    }

    /// Returns the session, if one exists.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Returns whether a signed-in session exists.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    fn to_record(&self) -> SessionRecord {
        match (&self.session, self.is_authenticated) {
            (Some(session), true) => SessionRecord::signed_in(session.clone()),
            _ => SessionRecord::signed_out(),
        }
    }
}

/// Application service owning the single mutable session.
///
/// State lives behind a [`watch`] channel: the sender serializes mutations,
/// so no two state transitions interleave, and every mutation publishes the
/// new snapshot to all subscribers synchronously before the call returns.
/// Write-through persistence is best effort; a failed write is logged and
/// the in-memory state stays authoritative.
#[derive(Clone)]
pub struct SessionService {
    registry: Arc<RoleRegistry>,
    record_store: Arc<dyn SessionRecordStore>,
    publisher: Arc<watch::Sender<SessionSnapshot>>,
}

impl SessionService {
    /// Creates a signed-out service over a registry and a record store.
    #[must_use]
    pub fn new(registry: Arc<RoleRegistry>, record_store: Arc<dyn SessionRecordStore>) -> Self {
        let (publisher, _) = watch::channel(SessionSnapshot::signed_out());

        Self {
            registry,
            record_store,
            publisher: Arc::new(publisher),
        }
    }

    /// Establishes a session for a signed-in user.
    ///
    /// Rejects an empty role set or an active role outside the held set
    /// with [`AppError::InvalidSession`], leaving any prior session
    /// untouched.
    pub async fn sign_in(
        &self,
        identity: UserIdentity,
        roles: BTreeSet<Role>,
        active_role: Role,
        locale: Locale,
        consent_accepted: bool,
    ) -> AppResult<()> {
        let session = Session::new(
            identity,
            roles,
            active_role,
            locale,
            consent_accepted,
            &self.registry,
        )?;

        info!(
            user_id = %session.identity().id(),
            active_role = session.active_role().as_str(),
            "session established"
        );

        self.publisher
            .send_replace(SessionSnapshot::signed_in(session));
        self.persist_current().await;
        Ok(())
    }

    /// Clears the session and the authentication flag together.
    pub async fn sign_out(&self) {
        let previous = self.publisher.send_replace(SessionSnapshot::signed_out());
        if previous.is_authenticated {
            info!("session cleared");
        }
        self.persist_current().await;
    }

    /// Switches the active role.
    ///
    /// A missing session or an unheld role makes this a silent no-op;
    /// otherwise the active role changes and permissions are re-derived
    /// (unchanged in value under the union rule).
    pub async fn switch_role(&self, role: Role) {
        let registry = Arc::clone(&self.registry);
        let switched = self.publisher.send_if_modified(|snapshot| {
            snapshot
                .session
                .as_mut()
                .is_some_and(|session| session.activate_role(role, &registry))
        });

        if switched {
            info!(active_role = role.as_str(), "active role switched");
            self.persist_current().await;
        }
    }

    /// Updates the consent flag. No-op without a session; idempotent.
    pub async fn update_consent(&self, accepted: bool) {
        let changed = self.publisher.send_if_modified(|snapshot| {
            snapshot
                .session
                .as_mut()
                .is_some_and(|session| session.set_consent(accepted))
        });

        if changed {
            self.persist_current().await;
        }
    }

    /// Updates the preferred locale. No-op without a session; idempotent.
    pub async fn update_locale(&self, locale: Locale) {
        let changed = self.publisher.send_if_modified(|snapshot| {
            snapshot
                .session
                .as_mut()
                .is_some_and(|session| session.set_locale(locale))
        });

        if changed {
            self.persist_current().await;
        }
    }

    /// Restores the session persisted by a previous run.
    ///
    /// An absent record is a signed-out start. A record with an
    /// unrecognized version is refused with [`AppError::Validation`]; so is
    /// a stored session violating the structural invariants. Permissions
    /// are re-derived from the registry, not read from storage.
    pub async fn restore(&self) -> AppResult<()> {
        let Some(record) = self.record_store.load().await? else {
            return Ok(());
        };

        if record.version != SESSION_RECORD_VERSION {
            return Err(AppError::Validation(format!(
                "unsupported session record version {} (expected {SESSION_RECORD_VERSION})",
                record.version
            )));
        }

        let snapshot = match (record.state, record.is_authenticated) {
            (Some(mut session), true) => {
                session.revalidate(&self.registry)?;
                SessionSnapshot::signed_in(session)
            }
            _ => SessionSnapshot::signed_out(),
        };

        self.publisher.send_replace(snapshot);
        Ok(())
    }

    /// Returns the currently active role, if signed in.
    #[must_use]
    pub fn current_role(&self) -> Option<Role> {
        self.publisher
            .borrow()
            .session
            .as_ref()
            .map(Session::active_role)
    }

    /// Returns the derived permission set, empty when signed out.
    #[must_use]
    pub fn current_permissions(&self) -> BTreeSet<Permission> {
        self.publisher
            .borrow()
            .session
            .as_ref()
            .map(|session| session.permissions().clone())
            .unwrap_or_default()
    }

    /// Returns whether a signed-in session exists.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.publisher.borrow().is_authenticated
    }

    /// Returns a copy of the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.publisher.borrow().clone()
    }

    /// Returns a receiver observing every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.publisher.subscribe()
    }

    /// Returns the registry this service derives permissions from.
    #[must_use]
    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    async fn persist_current(&self) {
        let record = self.publisher.borrow().to_record();
        if let Err(error) = self.record_store.save(&record).await {
            warn!(%error, "session record write failed; in-memory state remains authoritative");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use async_trait::async_trait;
    use campus_core::{AppError, AppResult, UserId, UserIdentity};
    use campus_domain::{Locale, Permission, Role, RoleRegistry};
    use tokio::sync::RwLock;

    use crate::session_ports::{SESSION_RECORD_VERSION, SessionRecord, SessionRecordStore};

    use super::SessionService;

    #[derive(Default)]
    struct FakeRecordStore {
        record: RwLock<Option<SessionRecord>>,
    }

    #[async_trait]
    impl SessionRecordStore for FakeRecordStore {
        async fn load(&self) -> AppResult<Option<SessionRecord>> {
            Ok(self.record.read().await.clone())
        }

        async fn save(&self, record: &SessionRecord) -> AppResult<()> {
            *self.record.write().await = Some(record.clone());
            Ok(())
        }
    }

    struct FailingRecordStore;

    #[async_trait]
    impl SessionRecordStore for FailingRecordStore {
        async fn load(&self) -> AppResult<Option<SessionRecord>> {
            Err(AppError::Persistence("store offline".to_owned()))
        }

        async fn save(&self, _record: &SessionRecord) -> AppResult<()> {
            Err(AppError::Persistence("store offline".to_owned()))
        }
    }

    fn identity() -> UserIdentity {
        UserIdentity::new(
            UserId::new(),
            "Mei Lin",
            "mei.lin@campus.example",
            "https://cdn.campus.example/avatars/mei.png",
        )
    }

    fn roles(values: &[Role]) -> BTreeSet<Role> {
        values.iter().copied().collect()
    }

    fn service_with(store: Arc<dyn SessionRecordStore>) -> SessionService {
        SessionService::new(Arc::new(RoleRegistry::standard()), store)
    }

    async fn signed_in_service(store: Arc<dyn SessionRecordStore>) -> SessionService {
        let service = service_with(store);
        let result = service
            .sign_in(
                identity(),
                roles(&[Role::Instructor, Role::DepartmentHead]),
                Role::Instructor,
                Locale::En,
                true,
            )
            .await;
        assert!(result.is_ok());
        service
    }

    #[tokio::test]
    async fn sign_in_derives_union_of_all_held_roles() {
        let service = signed_in_service(Arc::new(FakeRecordStore::default())).await;

        let permissions = service.current_permissions();
        assert!(permissions.contains(&Permission::AttendanceMark));
        assert!(permissions.contains(&Permission::KpiView));
        assert!(service.is_authenticated());
    }

    #[tokio::test]
    async fn sign_in_rejects_unheld_active_role_and_keeps_prior_state() {
        let service = signed_in_service(Arc::new(FakeRecordStore::default())).await;

        let result = service
            .sign_in(
                identity(),
                roles(&[Role::Learner]),
                Role::SystemAdmin,
                Locale::En,
                false,
            )
            .await;

        assert!(matches!(result, Err(AppError::InvalidSession(_))));
        assert_eq!(service.current_role(), Some(Role::Instructor));
    }

    #[tokio::test]
    async fn sign_in_rejects_empty_role_set() {
        let service = service_with(Arc::new(FakeRecordStore::default()));

        let result = service
            .sign_in(identity(), BTreeSet::new(), Role::Learner, Locale::En, false)
            .await;

        assert!(matches!(result, Err(AppError::InvalidSession(_))));
        assert!(!service.is_authenticated());
    }

    #[tokio::test]
    async fn switch_to_held_role_keeps_permissions() {
        let service = signed_in_service(Arc::new(FakeRecordStore::default())).await;
        let before = service.current_permissions();

        service.switch_role(Role::DepartmentHead).await;

        assert_eq!(service.current_role(), Some(Role::DepartmentHead));
        assert_eq!(service.current_permissions(), before);
    }

    #[tokio::test]
    async fn switch_to_unheld_role_is_a_no_op() {
        let store = Arc::new(FakeRecordStore::default());
        let service = signed_in_service(store.clone()).await;
        let before = service.snapshot();

        service.switch_role(Role::SystemAdmin).await;

        assert_eq!(service.snapshot(), before);
    }

    #[tokio::test]
    async fn switch_without_session_is_a_no_op() {
        let service = service_with(Arc::new(FakeRecordStore::default()));

        service.switch_role(Role::Learner).await;

        assert!(!service.is_authenticated());
        assert_eq!(service.current_role(), None);
    }

    #[tokio::test]
    async fn sign_out_clears_session_and_flag_together() {
        let store = Arc::new(FakeRecordStore::default());
        let service = signed_in_service(store.clone()).await;

        service.sign_out().await;

        assert!(!service.is_authenticated());
        assert_eq!(service.current_role(), None);
        assert!(service.current_permissions().is_empty());

        let stored = store.record.read().await.clone();
        assert_eq!(stored, Some(SessionRecord::signed_out()));
    }

    #[tokio::test]
    async fn consent_update_is_idempotent() {
        let service = signed_in_service(Arc::new(FakeRecordStore::default())).await;

        service.update_consent(false).await;
        let once = service.snapshot();
        service.update_consent(false).await;

        assert_eq!(service.snapshot(), once);
    }

    #[tokio::test]
    async fn preference_updates_without_session_are_no_ops() {
        let service = service_with(Arc::new(FakeRecordStore::default()));

        service.update_consent(true).await;
        service.update_locale(Locale::Zh).await;

        assert!(!service.is_authenticated());
    }

    #[tokio::test]
    async fn locale_update_mutates_only_locale() {
        let service = signed_in_service(Arc::new(FakeRecordStore::default())).await;
        let permissions_before = service.current_permissions();

        service.update_locale(Locale::Zh).await;

        let snapshot = service.snapshot();
        let session = snapshot.session();
        assert!(session.is_some());
        assert_eq!(session.map(|session| session.locale()), Some(Locale::Zh));
        assert_eq!(service.current_permissions(), permissions_before);
    }

    #[tokio::test]
    async fn persistence_failure_does_not_fail_the_mutation() {
        let service = service_with(Arc::new(FailingRecordStore));

        let result = service
            .sign_in(
                identity(),
                roles(&[Role::Learner]),
                Role::Learner,
                Locale::En,
                true,
            )
            .await;

        assert!(result.is_ok());
        assert!(service.is_authenticated());
    }

    #[tokio::test]
    async fn restore_roundtrips_a_persisted_session() {
        let store = Arc::new(FakeRecordStore::default());
        let original = signed_in_service(store.clone()).await;
        let expected = original.snapshot();

        let restored = service_with(store);
        let result = restored.restore().await;

        assert!(result.is_ok());
        assert_eq!(restored.snapshot(), expected);
    }

    #[tokio::test]
    async fn restore_with_nothing_persisted_stays_signed_out() {
        let service = service_with(Arc::new(FakeRecordStore::default()));

        let result = service.restore().await;

        assert!(result.is_ok());
        assert!(!service.is_authenticated());
    }

    #[tokio::test]
    async fn restore_refuses_unknown_record_version() {
        let store = Arc::new(FakeRecordStore::default());
        *store.record.write().await = Some(SessionRecord {
            state: None,
            is_authenticated: false,
            version: SESSION_RECORD_VERSION + 1,
        });

        let service = service_with(store);
        let result = service.restore().await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(!service.is_authenticated());
    }

    #[tokio::test]
    async fn subscribers_observe_each_published_snapshot() {
        let service = service_with(Arc::new(FakeRecordStore::default()));
        let mut receiver = service.subscribe();

        let result = service
            .sign_in(
                identity(),
                roles(&[Role::Learner]),
                Role::Learner,
                Locale::En,
                true,
            )
            .await;
        assert!(result.is_ok());

        assert!(receiver.has_changed().unwrap_or(false));
        let observed = receiver.borrow_and_update().clone();
        assert!(observed.is_authenticated());

        service.sign_out().await;
        assert!(receiver.has_changed().unwrap_or(false));
        assert!(!receiver.borrow_and_update().is_authenticated());
    }
}
