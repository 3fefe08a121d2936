//! Plain-text message templates with `{{name}}` placeholders.

use super::{TemplateKind, TemplateVars};

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

fn source(kind: TemplateKind) -> (&'static str, &'static str) {
    match kind {
        TemplateKind::PasswordReset => (
            "Reset your portal password",
            "Hello {{name}},\n\n\
             A password reset was requested for your account. Open the link below to choose a new password:\n\n\
             {{link}}\n\n\
             The link is valid for {{expires_in_minutes}} minutes and can be used once. \
             If you did not request a reset, ignore this message.\n",
        ),
        TemplateKind::InstallerInvitation => (
            "{{inviter_company}} invited you to the installer portal",
            "Hello {{name}},\n\n\
             {{inviter_name}} of {{inviter_company}} invited {{company_name}} to join the portal as an installer.\n\n\
             Accept the invitation and set your password here:\n\n\
             {{link}}\n\n\
             This invitation expires on {{expires_at}}.\n",
        ),
        TemplateKind::UserInvitation => (
            "{{inviter_company}} invited you to the document portal",
            "Hello {{name}},\n\n\
             {{inviter_name}} of {{inviter_company}} invited you to access their documents.\n\n\
             Accept the invitation and set your password here:\n\n\
             {{link}}\n\n\
             This invitation expires on {{expires_at}}.\n",
        ),
        TemplateKind::DistributorInvitation => (
            "Join the {{organization}} team on the portal",
            "Hello {{name}},\n\n\
             {{inviter_name}} invited you to join the {{organization}} distributor team.\n\n\
             Accept the invitation and set your password here:\n\n\
             {{link}}\n\n\
             This invitation expires on {{expires_at}}.\n",
        ),
        TemplateKind::ShareNotification => (
            "{{sender_name}} shared a document with you",
            "Hello {{name}},\n\n\
             {{sender_name}} shared \"{{document_name}}\" with you.\n\n\
             {{link}}\n",
        ),
        TemplateKind::Welcome => (
            "Welcome to the portal",
            "Hello {{name}},\n\n\
             Your account is ready. Sign in at {{link}} with {{email}}.\n",
        ),
    }
}

/// Replaces every `{{key}}` with its variable. Unknown placeholders render empty.
fn substitute(template: &str, vars: &TemplateVars) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                if let Some(value) = vars.get(key) {
                    out.push_str(value);
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn render(kind: TemplateKind, vars: &TemplateVars) -> RenderedMessage {
    let (subject, body) = source(kind);
    RenderedMessage {
        subject: substitute(subject, vars),
        body: substitute(body, vars),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> TemplateVars {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_substitute_known_and_unknown() {
        let v = vars(&[("name", "Ann")]);
        assert_eq!(substitute("Hi {{name}}, {{ missing }}!", &v), "Hi Ann, !");
        assert_eq!(substitute("no placeholders", &v), "no placeholders");
        assert_eq!(substitute("dangling {{name", &v), "dangling {{name");
    }

    #[test]
    fn test_installer_invitation_carries_link() {
        let v = vars(&[
            ("name", "Ian"),
            ("inviter_name", "Dora"),
            ("inviter_company", "D1"),
            ("company_name", "Acme"),
            ("link", "https://p/accept-invitation?token=t&role=installer"),
            ("expires_at", "2026-01-08"),
        ]);
        let msg = render(TemplateKind::InstallerInvitation, &v);
        assert_eq!(msg.subject, "D1 invited you to the installer portal");
        assert!(msg.body.contains("invited Acme to join"));
        assert!(msg.body.contains("token=t&role=installer"));
        assert!(!msg.body.contains("{{"));
    }

    #[test]
    fn test_distributor_invitation_names_the_organization_joined() {
        let v = vars(&[
            ("name", "Nora"),
            ("inviter_name", "Dora"),
            ("inviter_company", "D1"),
            ("organization", "Northwind"),
            ("link", "https://p/accept-invitation?token=t&role=distributor"),
            ("expires_at", "2026-01-08"),
        ]);
        let msg = render(TemplateKind::DistributorInvitation, &v);
        assert_eq!(msg.subject, "Join the Northwind team on the portal");
        assert!(msg.body.contains("join the Northwind distributor team"));
    }
}
