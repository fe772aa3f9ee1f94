use strum::{Display, EnumString};

/// Views the session core can send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Route {
    Login,
    Dashboard,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
        }
    }
}

/// Navigation capability handed to the controller by the UI layer.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

impl<F> Navigator for F
where
    F: Fn(Route) + Send + Sync,
{
    fn navigate(&self, route: Route) {
        self(route)
    }
}
