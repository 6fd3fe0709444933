//! Route table and the private/public gate.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    SignIn,
    SignUp,
    ForgotPassword,
    Dashboard,
    Profile,
}

impl Route {
    pub const ALL: [Route; 5] = [
        Route::SignIn,
        Route::SignUp,
        Route::ForgotPassword,
        Route::Dashboard,
        Route::Profile,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::SignIn => "/",
            Route::SignUp => "/signup",
            Route::ForgotPassword => "/forgot-password",
            Route::Dashboard => "/dashboard",
            Route::Profile => "/profile",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|route| route.path() == path)
    }

    /// Private routes need a session
    pub fn is_private(&self) -> bool {
        matches!(self, Route::Dashboard | Route::Profile)
    }

    /// Where a request for this route actually lands.
    ///
    /// Private routes send signed-out users to sign-in; public routes send
    /// signed-in users to the dashboard.
    pub fn resolve(self, authenticated: bool) -> Route {
        match (self.is_private(), authenticated) {
            (true, false) => Route::SignIn,
            (false, true) => Route::Dashboard,
            _ => self,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_routes_redirect_to_sign_in() {
        assert_eq!(Route::Dashboard.resolve(false), Route::SignIn);
        assert_eq!(Route::Profile.resolve(false), Route::SignIn);
        assert_eq!(Route::Profile.resolve(true), Route::Profile);
    }

    #[test]
    fn test_public_routes_redirect_to_dashboard() {
        assert_eq!(Route::SignIn.resolve(true), Route::Dashboard);
        assert_eq!(Route::SignUp.resolve(true), Route::Dashboard);
        assert_eq!(Route::ForgotPassword.resolve(false), Route::ForgotPassword);
    }

    #[test]
    fn test_from_path() {
        for route in Route::ALL {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
        assert_eq!(Route::from_path("/nope"), None);
    }
}
