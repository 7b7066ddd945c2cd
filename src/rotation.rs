use rand::seq::SliceRandom;

/// The proxy and user agent a single request attempt goes out with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub proxy: Option<String>,
    pub user_agent: String,
}

impl Identity {
    /// The proxy as it appears in log lines.
    pub fn proxy_label(&self) -> &str {
        self.proxy.as_deref().unwrap_or("none")
    }
}

/// Chooses an identity for every request attempt.
pub trait IdentityPicker: Send + Sync {
    fn pick(&self) -> Identity;
}

/// Picks a proxy and a user agent uniformly at random from the configured pools.
#[derive(Debug, Clone)]
pub struct RandomRotation {
    proxies: Vec<Option<String>>,
    user_agents: Vec<String>,
}

impl RandomRotation {
    pub fn new(proxies: Vec<Option<String>>, user_agents: Vec<String>) -> Self {
        Self {
            proxies,
            user_agents,
        }
    }
}

impl IdentityPicker for RandomRotation {
    fn pick(&self) -> Identity {
        let mut rng = rand::thread_rng();
        Identity {
            proxy: self.proxies.choose(&mut rng).cloned().flatten(),
            user_agent: self.user_agents.choose(&mut rng).cloned().unwrap_or_default(),
        }
    }
}
