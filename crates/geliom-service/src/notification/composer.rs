//! Message composer.

use rand::Rng;
use rand::seq::IndexedRandom;

/// Template used when a status has no message pool.
pub const DEFAULT_TEMPLATE: &str = "{name} durumunu \"{status}\" olarak güncelledi";

/// Picks a template and fills in `{name}`, `{group}` and `{status}`.
#[derive(Debug, Clone)]
pub struct MessageComposer {
    default_template: String,
}

impl Default for MessageComposer {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl MessageComposer {
    /// Create a composer with a custom fallback template.
    pub fn new(default_template: impl Into<String>) -> Self {
        Self {
            default_template: default_template.into(),
        }
    }

    /// Compose a message.
    ///
    /// A non-empty `templates` pool is sampled uniformly with `rng`.
    /// Placeholders are replaced literally; `{status}` is left in place
    /// when no status is supplied, as is any unknown placeholder.
    pub fn compose<R>(
        &self,
        rng: &mut R,
        templates: Option<&[String]>,
        name: &str,
        group: &str,
        status: Option<&str>,
    ) -> String
    where
        R: Rng + ?Sized,
    {
        let template = templates
            .and_then(|pool| pool.choose(rng))
            .map(String::as_str)
            .unwrap_or(&self.default_template);

        fill(template, name, group, status)
    }
}

/// Substitute placeholders in one pass over `template`, so text coming from
/// a value is never itself treated as a placeholder.
fn fill(template: &str, name: &str, group: &str, status: Option<&str>) -> String {
    let mut message = String::with_capacity(template.len() + name.len() + group.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        message.push_str(&rest[..start]);
        let tail = &rest[start..];
        let token = tail.find('}').map(|end| &tail[..=end]);
        let value = match token {
            Some("{name}") => Some(name),
            Some("{group}") => Some(group),
            Some("{status}") => status,
            _ => None,
        };
        match (token, value) {
            (Some(token), Some(value)) => {
                message.push_str(value);
                rest = &tail[token.len()..];
            }
            _ => {
                message.push('{');
                rest = &tail[1..];
            }
        }
    }
    message.push_str(rest);
    message
}
