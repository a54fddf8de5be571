//! `WWW-Authenticate` bearer challenge parsing

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::errors::DeployError;

#[derive(Parser)]
#[grammar = "registry/challenge.pest"]
struct ChallengeParser;

/// Parameters of a registry bearer challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryChallenge {
    pub realm: String,
    pub service: String,
    pub scope: String,
}

impl RegistryChallenge {
    /// Parse `Bearer realm="...",service="...",scope="..."`.
    ///
    /// Keys may appear in any order and quoted values may contain commas and `\` escapes.
    /// An empty header, a scheme other than `Bearer`, or a header missing any of the three
    /// keys is an [`DeployError::AuthChallengeError`].
    pub fn parse(header: &str) -> Result<Self, DeployError> {
        if header.trim().is_empty() {
            return Err(DeployError::AuthChallengeError(
                "Expected 401 response to contain Www-Authenticate header".to_string(),
            ));
        }

        let challenge = ChallengeParser::parse(Rule::challenge, header)
            .map_err(|e| {
                DeployError::AuthChallengeError(format!(
                    "Invalid Www-Authenticate header '{}': {}",
                    header, e
                ))
            })?
            .next()
            .ok_or_else(|| {
                DeployError::AuthChallengeError(format!("Invalid Www-Authenticate header '{}'", header))
            })?;

        let (mut realm, mut service, mut scope) = (String::new(), String::new(), String::new());
        for pair in challenge.into_inner() {
            match pair.as_rule() {
                Rule::scheme if !pair.as_str().eq_ignore_ascii_case("bearer") => {
                    return Err(DeployError::AuthChallengeError(format!(
                        "Unsupported authentication scheme '{}'",
                        pair.as_str()
                    )));
                }
                Rule::params => {
                    for param in pair.into_inner() {
                        let mut parts = param.into_inner();
                        let (Some(name), Some(value)) = (parts.next(), parts.next()) else {
                            continue;
                        };
                        let value = value_text(value);
                        match name.as_str().to_ascii_lowercase().as_str() {
                            "realm" => realm = value,
                            "service" => service = value,
                            "scope" => scope = value,
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }

        if realm.is_empty() || service.is_empty() || scope.is_empty() {
            return Err(DeployError::AuthChallengeError(format!(
                "Realm, service or scope empty (realm: '{}', service: '{}', scope: '{}')",
                realm, service, scope
            )));
        }

        Ok(Self {
            realm,
            service,
            scope,
        })
    }
}

/// Text of a parameter value with quotes removed and escapes resolved
fn value_text(value: Pair<Rule>) -> String {
    value
        .into_inner()
        .map(|inner| match inner.as_rule() {
            Rule::quoted => inner
                .into_inner()
                .map(|part| match part.as_rule() {
                    Rule::escaped => part.as_str().get(1..).unwrap_or_default().to_string(),
                    _ => part.as_str().to_string(),
                })
                .collect(),
            _ => inner.as_str().to_string(),
        })
        .collect()
}
