use serde::{Deserialize, Serialize};

const MIN_MESSAGE_LEN: usize = 10;

/// What the contact form collects. Phone is the only optional field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

/// One failed check, tied to the field that failed it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl ContactForm {
    /// Check every field and collect what's wrong. An empty result means
    /// the form can be submitted.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(FieldError {
                field: "name",
                message: "name is required",
            });
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.push(FieldError {
                field: "email",
                message: "email is required",
            });
        } else if !email_looks_valid(email) {
            errors.push(FieldError {
                field: "email",
                message: "email address is not valid",
            });
        }

        let phone = self.phone.trim();
        if !phone.is_empty() && !phone_looks_valid(phone) {
            errors.push(FieldError {
                field: "phone",
                message: "phone number contains invalid characters",
            });
        }

        if self.message.trim().is_empty() {
            errors.push(FieldError {
                field: "message",
                message: "message is required",
            });
        } else if self.message.trim().chars().count() < MIN_MESSAGE_LEN {
            errors.push(FieldError {
                field: "message",
                message: "message is too short",
            });
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

fn email_looks_valid(email: &str) -> bool {
    if email.chars().any(|c| c.is_whitespace()) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

fn phone_looks_valid(phone: &str) -> bool {
    phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
}

/// The message shown after a submit attempt, in the visitor's language
pub fn submit_feedback(valid: bool, language: &str) -> &'static str {
    match (valid, language) {
        (true, "ar") => "تم إرسال رسالتك بنجاح! سنتواصل معك قريباً.",
        (true, _) => "Your message has been sent successfully! We will contact you soon.",
        (false, "ar") => "يرجى تصحيح الأخطاء في النموذج قبل الإرسال.",
        (false, _) => "Please correct the errors in the form before submitting.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> ContactForm {
        ContactForm {
            name: "Sara Ahmed".to_string(),
            email: "sara@example.com".to_string(),
            phone: "+966 50 123 4567".to_string(),
            message: "I would like a consultation about market entry.".to_string(),
        }
    }

    #[test]
    fn test_a_complete_form_passes() {
        assert!(filled().is_valid());
    }

    #[test]
    fn test_phone_is_optional() {
        let mut form = filled();
        form.phone = String::new();
        assert!(form.is_valid());
    }

    #[test]
    fn test_empty_form_reports_every_required_field() {
        let errors = ContactForm::default().validate();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "email", "message"]);
    }

    #[test]
    fn test_whitespace_does_not_count_as_filled() {
        let mut form = filled();
        form.name = "   ".to_string();
        let errors = form.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "name");
    }

    #[test]
    fn test_bad_email_shapes_are_rejected() {
        for bad in ["no-at-sign", "@nolocal.com", "spaces in@mail.com", "x@nodot", "x@.com"] {
            let mut form = filled();
            form.email = bad.to_string();
            assert!(!form.is_valid(), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn test_letters_in_the_phone_are_rejected() {
        let mut form = filled();
        form.phone = "call me".to_string();
        let errors = form.validate();
        assert_eq!(errors[0].field, "phone");
    }

    #[test]
    fn test_short_messages_are_rejected() {
        let mut form = filled();
        form.message = "hi".to_string();
        let errors = form.validate();
        assert_eq!(errors[0].field, "message");
        assert_eq!(errors[0].message, "message is too short");
    }

    #[test]
    fn test_feedback_matches_language_and_outcome() {
        assert!(submit_feedback(true, "ar").contains("تم إرسال"));
        assert!(submit_feedback(true, "en").contains("successfully"));
        assert!(submit_feedback(false, "ar").contains("يرجى"));
        assert!(submit_feedback(false, "en").contains("correct the errors"));
    }
}
