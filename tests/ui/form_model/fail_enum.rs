#[derive(Clone, calmform::form::FormModel)]
enum ChoiceForm {
    Email,
    Phone,
}

fn main() {}
