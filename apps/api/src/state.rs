use staffgate_application::{
    AccessResolverService, GrantService, RevocationService, RoleTemplateService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub grant_service: GrantService,
    pub role_template_service: RoleTemplateService,
    pub revocation_service: RevocationService,
    pub access_resolver_service: AccessResolverService,
}
