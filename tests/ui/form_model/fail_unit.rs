#[derive(Clone, calmform::form::FormModel)]
struct UnitForm;

fn main() {}
