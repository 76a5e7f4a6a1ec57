#[derive(Clone, calmform::form::FormModel)]
struct ContactForm {
    home_phone: String,
    home_phone_: String,
}

fn main() {}
