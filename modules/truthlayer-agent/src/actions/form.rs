use async_trait::async_trait;
use browserless_client::BrowserlessClient;
use serde::Serialize;
use tracing::{info, warn};
use truthlayer_common::UserInfo;

/// Best-effort contact-form auto-fill on a listing page.
#[async_trait]
pub trait FormFiller: Send + Sync {
    /// True when at least one field was filled.
    async fn fill_contact_form(&self, url: &str, user: &UserInfo) -> bool;
}

/// No browser configured: nothing can be filled.
pub struct NoFormFiller;

#[async_trait]
impl FormFiller for NoFormFiller {
    async fn fill_contact_form(&self, url: &str, _user: &UserInfo) -> bool {
        info!(url, "No browser configured, skipping form auto-fill");
        false
    }
}

/// Types the requester's details into the first matching inputs on the page.
const FILL_FORM_FN: &str = r#"
export default async function ({ page, context }) {
  await page.goto(context.url, { waitUntil: 'networkidle2', timeout: 30000 });
  let filled = 0;
  for (const field of context.fields) {
    for (const selector of field.selectors) {
      try {
        await page.type(selector, field.value, { delay: 100 });
        filled += 1;
        break;
      } catch (e) {}
    }
  }
  return { data: { filled }, type: 'application/json' };
}
"#;

#[derive(Debug, Serialize)]
struct FormField<'a> {
    selectors: &'static [&'static str],
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct FormContext<'a> {
    url: &'a str,
    fields: Vec<FormField<'a>>,
}

const NAME_SELECTORS: &[&str] = &[
    r#"input[name*="name"]"#,
    "#name",
    ".name",
    r#"input[placeholder*="name" i]"#,
];
const EMAIL_SELECTORS: &[&str] = &[
    r#"input[name*="email"]"#,
    "#email",
    ".email",
    r#"input[type="email"]"#,
];
const PHONE_SELECTORS: &[&str] = &[
    r#"input[name*="phone"]"#,
    "#phone",
    ".phone",
    r#"input[type="tel"]"#,
];
const MESSAGE_SELECTORS: &[&str] = &[
    r#"textarea[name*="message"]"#,
    "#message",
    ".message",
    "textarea",
];

pub struct BrowserlessFormFiller {
    client: BrowserlessClient,
}

impl BrowserlessFormFiller {
    pub fn new(client: BrowserlessClient) -> Self {
        Self { client }
    }
}

fn form_context<'a>(url: &'a str, user: &'a UserInfo) -> FormContext<'a> {
    let mut fields = vec![
        FormField {
            selectors: NAME_SELECTORS,
            value: &user.name,
        },
        FormField {
            selectors: EMAIL_SELECTORS,
            value: &user.email,
        },
    ];
    if let Some(phone) = user.phone.as_deref() {
        fields.push(FormField {
            selectors: PHONE_SELECTORS,
            value: phone,
        });
    }
    if let Some(message) = user.message.as_deref() {
        fields.push(FormField {
            selectors: MESSAGE_SELECTORS,
            value: message,
        });
    }
    FormContext { url, fields }
}

#[async_trait]
impl FormFiller for BrowserlessFormFiller {
    async fn fill_contact_form(&self, url: &str, user: &UserInfo) -> bool {
        let context = form_context(url, user);
        match self.client.function(FILL_FORM_FN, &context).await {
            Ok(result) => {
                let filled = result.get("filled").and_then(|v| v.as_u64()).unwrap_or(0);
                info!(url, filled, "Contact form auto-fill finished");
                filled > 0
            }
            Err(e) => {
                warn!(url, error = %e, "Contact form auto-fill failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_are_skipped() {
        let user = UserInfo {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            message: Some("Is it still available?".to_string()),
        };
        let context = serde_json::to_value(form_context("https://example.com", &user)).unwrap();
        let fields = context["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[2]["value"], "Is it still available?");
        assert_eq!(fields[2]["selectors"][3], "textarea");
    }
}
