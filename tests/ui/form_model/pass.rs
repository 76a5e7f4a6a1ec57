use calmform::form::{FieldKey, FieldLens, FieldValue, FormModel};

#[derive(Clone, calmform::form::FormModel)]
pub struct SignupForm {
    email: String,
    age: u32,
    r#type: String,
    newsletter: bool,
}

fn main() {
    let fields = SignupForm::fields();
    let lens = fields.email();
    let mut model = SignupForm {
        email: "a@example.com".to_string(),
        age: 0,
        r#type: "personal".to_string(),
        newsletter: false,
    };
    lens.set(&mut model, "b@example.com".to_string());
    assert_eq!(lens.key().as_str(), "email");
    assert_eq!(lens.get(&model), "b@example.com");
    assert_eq!(fields.r#type().key(), FieldKey::new("type"));

    let mut seen = Vec::new();
    model.visit_fields(&mut |key, value: &dyn FieldValue| {
        seen.push(format!("{key}={}", value.to_form_string()));
    });
    assert_eq!(
        seen,
        ["email=b@example.com", "age=0", "type=personal", "newsletter=false"]
    );
}
