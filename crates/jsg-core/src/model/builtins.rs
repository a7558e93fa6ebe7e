use super::type_ref::UNIT;
use super::types::{TypeDef, TypeKind};

const INTEGERS: &[&str] = &[
    "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize",
];
const FLOATS: &[&str] = &["f32", "f64"];
const SEQUENCES: &[&str] = &["Vec", "VecDeque", "LinkedList", "HashSet", "BTreeSet"];
const MAPS: &[&str] = &["HashMap", "BTreeMap", "IndexMap"];
const STRING_LIKE: &[&str] = &[
    "String",
    "str",
    "chrono::NaiveDateTime",
    "chrono::DateTime",
    "chrono::NaiveDate",
    "uuid::Uuid",
];

pub(super) fn builtin_types() -> Vec<TypeDef> {
    let mut defs = Vec::new();
    defs.extend(
        INTEGERS
            .iter()
            .map(|n| TypeDef::primitive(*n, TypeKind::Integer)),
    );
    defs.extend(FLOATS.iter().map(|n| TypeDef::primitive(*n, TypeKind::Number)));
    defs.push(TypeDef::primitive("bool", TypeKind::Boolean));
    defs.push(TypeDef::primitive("char", TypeKind::String));
    defs.extend(STRING_LIKE.iter().map(|n| TypeDef::new(*n, TypeKind::String)));
    defs.push(TypeDef::new(UNIT, TypeKind::Null));
    defs.extend(
        SEQUENCES
            .iter()
            .map(|n| TypeDef::new(*n, TypeKind::Array).params(["T"])),
    );
    defs.extend(
        MAPS.iter()
            .map(|n| TypeDef::new(*n, TypeKind::Map).params(["K", "V"])),
    );
    defs.push(TypeDef::new("Option", TypeKind::Optional).params(["T"]));
    defs
}
