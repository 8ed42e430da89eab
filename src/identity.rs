use crate::api::SpeedrunApi;
use crate::types::UNKNOWN_RUNNER;

/// Maps a registered runner id to a display name.
pub trait IdentityResolver {
    fn display_name(&self, runner_id: &str) -> String;
}

/// Looks every id up through `/users/{id}`. Nothing is cached, so a runner
/// with many runs is looked up once per run.
pub struct ApiIdentityResolver<'a> {
    api: &'a SpeedrunApi,
    log_level: u8,
}

impl<'a> ApiIdentityResolver<'a> {
    pub fn new(api: &'a SpeedrunApi, log_level: u8) -> Self {
        Self { api, log_level }
    }
}

impl IdentityResolver for ApiIdentityResolver<'_> {
    fn display_name(&self, runner_id: &str) -> String {
        if runner_id.is_empty() {
            return UNKNOWN_RUNNER.to_string();
        }
        match self.api.user(runner_id) {
            Ok(user) => user
                .names
                .international
                .unwrap_or_else(|| UNKNOWN_RUNNER.to_string()),
            Err(e) => {
                vprintln!(self.log_level, 2, "runner lookup failed for {}: {}", runner_id, e);
                UNKNOWN_RUNNER.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use reqwest::blocking::Client;

    #[test]
    fn resolves_international_name() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/users/u1");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"data":{"id":"u1","names":{"international":"cheese","japanese":null}}}"#);
        });
        let api = SpeedrunApi::with_client(Client::new(), &server.url(""), 0);
        let resolver = ApiIdentityResolver::new(&api, 0);

        assert_eq!(resolver.display_name("u1"), "cheese");
        assert_eq!(resolver.display_name("u1"), "cheese");
        // no caching between lookups
        assert_eq!(mock.calls(), 2);
    }

    #[test]
    fn failures_and_missing_fields_fall_back_to_unknown() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/users/gone");
            then.status(404);
        });
        server.mock(|when, then| {
            when.method(GET).path("/users/nameless");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"data":{"id":"nameless"}}"#);
        });
        let api = SpeedrunApi::with_client(Client::new(), &server.url(""), 0);
        let resolver = ApiIdentityResolver::new(&api, 0);

        assert_eq!(resolver.display_name("gone"), "Unknown");
        assert_eq!(resolver.display_name("nameless"), "Unknown");
        assert_eq!(resolver.display_name(""), "Unknown");
    }
}
