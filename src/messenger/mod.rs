//! Message captions and delivery.

use async_trait::async_trait;
use minijinja::Environment;
use minijinja::context;

use crate::config::MessageTemplates;
use crate::error::AppError;
use crate::event::EventMatch;
use crate::messenger::error::SendError;

pub mod error;
pub mod telegram;

/// Delivers a photo with a caption to a chat.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_photo(&self, chat_id: &str, photo: &[u8], caption: &str)
    -> Result<(), SendError>;
}

/// Renders the personal and group captions of an event.
///
/// Templates use minijinja syntax with `name` and `event_name` in scope, e.g.
/// `Happy {{ event_name }}, {{ name }}!`.
pub struct MessageComposer {
    env: Environment<'static>,
    personal: String,
    group: String,
}

impl MessageComposer {
    pub fn new(templates: &MessageTemplates) -> Result<Self, AppError> {
        let env = Environment::new();
        for (name, source) in [("personal", &templates.personal), ("group", &templates.group)] {
            env.render_str(source, context! { name => "", event_name => "" })
                .map_err(|e| AppError::InvalidTemplate {
                    name: name.to_string(),
                    msg: e.to_string(),
                })?;
        }

        Ok(Self {
            env,
            personal: templates.personal.clone(),
            group: templates.group.clone(),
        })
    }

    pub fn personal(&self, event: &EventMatch) -> Result<String, minijinja::Error> {
        self.render(&self.personal, event)
    }

    pub fn group(&self, event: &EventMatch) -> Result<String, minijinja::Error> {
        self.render(&self.group, event)
    }

    fn render(&self, source: &str, event: &EventMatch) -> Result<String, minijinja::Error> {
        self.env.render_str(
            source,
            context! {
                name => event.name.as_str(),
                event_name => event.event_name.as_str(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> EventMatch {
        EventMatch {
            name: "Ada".to_string(),
            photo_ref: "ada.png".to_string(),
            telegram_id: None,
            event_name: "Birthday".to_string(),
        }
    }

    #[test]
    fn test_default_templates() {
        let composer = MessageComposer::new(&MessageTemplates::default()).unwrap();
        assert_eq!(composer.personal(&event()).unwrap(), "Happy Birthday, Ada! 🎉");
        assert_eq!(
            composer.group(&event()).unwrap(),
            "🎉 Today is Ada's Birthday! 🎉"
        );
    }

    #[test]
    fn test_custom_templates_are_not_escaped() {
        let composer = MessageComposer::new(&MessageTemplates {
            personal: "<b>{{ name }}</b>".to_string(),
            group: "{{ event_name | upper }} & more".to_string(),
        })
        .unwrap();
        assert_eq!(composer.personal(&event()).unwrap(), "<b>Ada</b>");
        assert_eq!(composer.group(&event()).unwrap(), "BIRTHDAY & more");
    }

    #[test]
    fn test_invalid_template_rejected() {
        let result = MessageComposer::new(&MessageTemplates {
            personal: "Happy {{ name".to_string(),
            group: "ok".to_string(),
        });
        assert!(matches!(
            result,
            Err(AppError::InvalidTemplate { ref name, .. }) if name == "personal"
        ));
    }
}
