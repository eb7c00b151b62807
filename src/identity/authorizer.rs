//! Composable authorization guards. Each guard has the uniform contract
//! `Access -> AppResult<Access>`; a route lists its guards in order and the
//! first failure stops the chain, so later guards never run speculatively.
//! Resolution guards must precede ownership guards: ownership cannot be
//! evaluated against a resource that did not resolve.

use super::principal::Principal;
use crate::error::{AppError, AppResult};
use crate::store::{Course, Role, SharedStore, User};

/// Everything a guard chain may consult or populate while deciding one
/// request: the authenticated identity plus path-resolved entities.
#[derive(Debug, Clone)]
pub struct Access {
    pub principal: Principal,
    pub profile: Option<User>,
    pub course: Option<Course>,
}

impl Access {
    pub fn new(principal: Principal) -> Self {
        Access {
            principal,
            profile: None,
            course: None,
        }
    }
}

/// A single authorization check in a chain.
pub type Guard = Box<dyn Fn(Access) -> AppResult<Access> + Send + Sync>;

/// Apply guards left-to-right, short-circuiting on the first failure.
pub fn apply(ctx: Access, guards: Vec<Guard>) -> AppResult<Access> {
    guards.into_iter().try_fold(ctx, |ctx, guard| guard(ctx))
}

/// Resolve the path-addressed acting user into the context. Absence maps to
/// a resolution failure, never to a grant.
pub fn resolve_profile(store: SharedStore, user_id: String) -> Guard {
    Box::new(move |mut ctx| {
        let user = store
            .0
            .read()
            .find_user_by_id(&user_id)
            .ok_or_else(|| AppError::resolution("Could not retrieve user."))?;
        ctx.profile = Some(user);
        Ok(ctx)
    })
}

/// Resolve the path-addressed course into the context.
pub fn resolve_course(store: SharedStore, course_id: String) -> Guard {
    Box::new(move |mut ctx| {
        let course = store
            .0
            .read()
            .find_course_by_id(&course_id)
            .ok_or_else(|| AppError::resolution("Could not retrieve course."))?;
        ctx.course = Some(course);
        Ok(ctx)
    })
}

/// The path-addressed user must be the authenticated identity itself.
pub fn require_self() -> Guard {
    Box::new(|ctx| match &ctx.profile {
        Some(profile) if profile.id == ctx.principal.user_id => Ok(ctx),
        _ => Err(AppError::Forbidden),
    })
}

/// The resolved acting user must carry the educator role.
pub fn require_educator() -> Guard {
    Box::new(|ctx| match &ctx.profile {
        Some(profile) if profile.role == Role::Educator => Ok(ctx),
        _ => Err(AppError::Forbidden),
    })
}

/// The resolved course's instructor must be the authenticated identity.
/// Distinct from `require_self`: this compares against the stored owner
/// field of the target resource, not the path-addressed user.
pub fn require_course_owner() -> Guard {
    Box::new(|ctx| match &ctx.course {
        Some(course) if course.instructor_id == ctx.principal.user_id => Ok(ctx),
        _ => Err(AppError::Forbidden),
    })
}
