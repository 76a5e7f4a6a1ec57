#[derive(Clone, calmform::form::FormModel)]
struct TupleForm(String);

fn main() {}
