use crate::{
    api::{admin, attendance},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::{Result, anyhow};
use std::sync::Arc;

type Limiter = Governor<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiter allowing `requests_per_min` requests, all of them as burst
fn build_limiter(requests_per_min: u32) -> Result<Limiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);

    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("Invalid rate limit: {requests_per_min} requests per minute"))?;

    Ok(Governor::new(&cfg))
}

pub struct Limiters {
    login: Arc<Limiter>,
    register: Arc<Limiter>,
    protected: Arc<Limiter>,
}

impl Limiters {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            login: Arc::new(build_limiter(config.rate_login_per_min)?),
            register: Arc::new(build_limiter(config.rate_register_per_min)?),
            protected: Arc::new(build_limiter(config.rate_protected_per_min)?),
        })
    }
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: &Limiters) {
    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(limiters.login.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(limiters.register.clone())
                    .route(web::post().to(handlers::register)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(limiters.protected.clone())
            .service(web::resource("/auth/profile").route(web::get().to(handlers::profile)))
            .configure(attendance_routes)
            .configure(admin_routes),
    );
}

pub fn attendance_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/attendance")
            .service(web::resource("/self").route(web::post().to(attendance::self_attendance)))
            .service(
                web::resource("/my-attendance").route(web::get().to(attendance::my_attendance)),
            )
            .service(web::resource("/mark").route(web::post().to(attendance::mark_attendance)))
            .service(web::resource("/mark-bulk").route(web::post().to(attendance::mark_bulk)))
            .service(
                web::resource("/update").route(web::put().to(attendance::update_attendance)),
            )
            // /attendance/team/{id}
            .service(
                web::resource("/team/{id}").route(web::get().to(attendance::team_attendance)),
            )
            // /attendance/user/{id}
            .service(
                web::resource("/user/{id}").route(web::get().to(attendance::user_attendance)),
            )
            .service(web::resource("/reports").route(web::get().to(attendance::reports))),
    );
}

pub fn admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .service(
                web::resource("/organizations")
                    .route(web::post().to(admin::create_organization))
                    .route(web::get().to(admin::list_organizations)),
            )
            .service(
                web::resource("/teams")
                    .route(web::post().to(admin::create_team))
                    .route(web::get().to(admin::list_teams)),
            )
            // /admin/teams/{id}/manager
            .service(
                web::resource("/teams/{id}/manager").route(web::put().to(admin::assign_manager)),
            )
            // /admin/teams/{id}/members
            .service(
                web::resource("/teams/{id}/members")
                    .route(web::post().to(admin::add_team_member)),
            )
            .service(
                web::resource("/users")
                    .route(web::post().to(admin::create_user_account))
                    .route(web::get().to(admin::list_users)),
            ),
    );
}
