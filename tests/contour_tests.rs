use contour_trace::contour::{ContourMember, ContourStore, Value};
use contour_trace::schema::{SchemaTable, StaticResolver, TypeKind};
use contour_trace::utils::config::{ROOT_TYPE, RPDL_MEMBER};
use contour_trace::utils::error::ContourError;
use pretty_assertions::assert_eq;

fn three_level_schema() -> SchemaTable {
    let mut table = SchemaTable::new();
    let animal = table.declare_type("Animal", TypeKind::Class, None);
    table.declare_field(animal, "name", "java.lang.String", false);
    table.declare_field(animal, "count", "int", true);
    let dog = table.declare_type("Dog", TypeKind::Class, Some("Animal"));
    table.declare_field(dog, "name", "java.lang.String", false);
    let puppy = table.declare_type("Puppy", TypeKind::Class, Some("Dog"));
    table.declare_field(puppy, "age", "int", false);
    table
}

#[test]
fn test_instance_chain_has_one_level_per_ancestor() {
    let mut table = three_level_schema();
    let puppy = table.resolve_type("Puppy");
    let mut store = ContourStore::new();

    let concrete = store.create_instance_contour(puppy, 0x10, &table).unwrap();
    let chain = store.instance_chain(concrete);
    assert_eq!(chain.len(), 4);

    let names: Vec<String> = chain
        .iter()
        .map(|&id| {
            let type_id = store.get(id).unwrap().type_id().unwrap();
            table.type_node(type_id).unwrap().name.clone()
        })
        .collect();
    assert_eq!(names, vec![ROOT_TYPE, "Animal", "Dog", "Puppy"]);

    // Every level shares the oid and is indexed under its own type name
    for (&id, name) in chain.iter().zip(&names) {
        assert_eq!(store.get(id).unwrap().oid(), Some(0x10));
        assert_eq!(store.lookup_instance_contour(name, 0x10), Some(id));
    }

    // Static chain was loaded along the way
    for name in &names {
        assert!(store.lookup_static_contour(name).is_some());
    }
}

#[test]
fn test_only_concrete_level_is_not_virtual() {
    let mut table = three_level_schema();
    let puppy = table.resolve_type("Puppy");
    let mut store = ContourStore::new();

    let concrete = store.create_instance_contour(puppy, 0x10, &table).unwrap();
    let chain = store.instance_chain(concrete);

    let (last, upper) = chain.split_last().unwrap();
    assert_eq!(*last, concrete);
    assert!(!store.get(concrete).unwrap().is_virtual());
    for &level in upper {
        assert!(store.get(level).unwrap().is_virtual());
        assert_eq!(store.concrete_contour(level), concrete);
    }
}

#[test]
fn test_create_instance_is_idempotent_per_oid() {
    let mut table = three_level_schema();
    let dog = table.resolve_type("Dog");
    let mut store = ContourStore::new();

    let first = store.create_instance_contour(dog, 0x20, &table).unwrap();
    let before = store.len();
    let again = store.create_instance_contour(dog, 0x20, &table).unwrap();

    assert_eq!(first, again);
    assert_eq!(store.len(), before);
}

#[test]
fn test_instance_ordinals_are_per_type() {
    let mut table = three_level_schema();
    let dog = table.resolve_type("Dog");
    let puppy = table.resolve_type("Puppy");
    let mut store = ContourStore::new();

    let dog_a = store.create_instance_contour(dog, 1, &table).unwrap();
    let puppy_a = store.create_instance_contour(puppy, 2, &table).unwrap();
    let dog_b = store.create_instance_contour(dog, 3, &table).unwrap();

    assert_eq!(store.get(dog_a).unwrap().ordinal(), 1);
    assert_eq!(store.get(dog_b).unwrap().ordinal(), 2);
    assert_eq!(store.get(puppy_a).unwrap().ordinal(), 1);

    // Ancestor levels carry the concrete type's ordinal
    for level in store.instance_chain(dog_b) {
        assert_eq!(store.get(level).unwrap().ordinal(), 2);
    }
    assert_eq!(store.object_count(), 3);
}

#[test]
fn test_static_members_stay_off_instances() {
    let mut table = three_level_schema();
    let animal = table.resolve_type("Animal");
    let mut store = ContourStore::new();

    let concrete = store.create_instance_contour(animal, 5, &table).unwrap();
    let names: Vec<&str> = store.get(concrete).unwrap().members().iter().map(|m| m.name()).collect();
    assert_eq!(names, vec!["name"]);

    let static_animal = store.lookup_static_contour("Animal").unwrap();
    let statics: Vec<&str> = store.get(static_animal).unwrap().members().iter().map(|m| m.name()).collect();
    assert_eq!(statics, vec!["count"]);
}

#[test]
fn test_find_member_prefers_nearest_level() {
    let mut table = three_level_schema();
    let puppy = table.resolve_type("Puppy");
    let mut store = ContourStore::new();

    let concrete = store.create_instance_contour(puppy, 7, &table).unwrap();
    let chain = store.instance_chain(concrete);
    let (animal_level, dog_level) = (chain[1], chain[2]);

    // Dog shadows Animal's `name`
    assert_eq!(store.find_member(concrete, "name"), Some((dog_level, 0)));
    assert_eq!(store.find_member(animal_level, "name"), Some((animal_level, 0)));
    assert_eq!(store.find_member(concrete, "age"), Some((concrete, 0)));
    assert_eq!(store.find_member(concrete, "missing"), None);
}

#[test]
fn test_array_contour_cells() {
    let mut table = SchemaTable::new();
    let ints = table.resolve_type("int[]");
    let mut store = ContourStore::new();

    let array = store.create_array_contour(ints, 0x30, 3, &table).unwrap();
    let contour = store.get(array).unwrap();
    assert!(contour.is_array());
    assert!(!contour.is_virtual());

    let names: Vec<&str> = contour.members().iter().map(|m| m.name()).collect();
    assert_eq!(names, vec!["[0]", "[1]", "[2]"]);
    assert_eq!(contour.member(2).unwrap().value(), &Value::Literal("0".to_string()));

    let chain = store.instance_chain(array);
    assert_eq!(chain.len(), 2);
    assert!(store.lookup_instance_contour(ROOT_TYPE, 0x30).is_some());
}

#[test]
fn test_array_requires_array_type() {
    let mut table = three_level_schema();
    let dog = table.resolve_type("Dog");
    let mut store = ContourStore::new();

    assert_eq!(
        store.create_array_contour(dog, 1, 2, &table),
        Err(ContourError::NotInstantiable("Dog".to_string()))
    );
}

#[test]
fn test_interfaces_are_not_instantiable() {
    let mut table = SchemaTable::new();
    let runnable = table.declare_type("Runnable", TypeKind::Interface, None);
    let mut store = ContourStore::new();

    assert!(matches!(
        store.create_instance_contour(runnable, 1, &table),
        Err(ContourError::NotInstantiable(_))
    ));
}

#[test]
fn test_slice_keeps_exempt_members() {
    let mut table = SchemaTable::new();
    let foo = table.declare_type("Foo", TypeKind::Class, None);
    let run = table.declare_method(foo, "run", &[("a", "int"), ("b", "int")], &[], "void");
    let mut store = ContourStore::new();
    let context = store.create_static_contour(foo, &table).unwrap();
    let method = store.create_method_contour(context, run, "1", &table).unwrap();

    let only_a = |m: &ContourMember| m.name() == "a";
    let visible: Vec<&str> = store
        .get(method)
        .unwrap()
        .visible_members(Some(&only_a))
        .into_iter()
        .map(|m| m.name())
        .collect();
    assert_eq!(visible, vec!["a", RPDL_MEMBER]);

    let all = store.get(method).unwrap().visible_members(None);
    assert_eq!(all.len(), 4);
}

#[test]
fn test_replace_member_returns_previous_value() {
    let mut table = three_level_schema();
    let puppy = table.resolve_type("Puppy");
    let mut store = ContourStore::new();
    let concrete = store.create_instance_contour(puppy, 9, &table).unwrap();

    let old = store.replace_member(concrete, 0, Value::Literal("3".to_string()));
    assert_eq!(old, Some(Value::Literal("0".to_string())));

    let old = store.replace_member(concrete, 0, Value::Literal("4".to_string()));
    assert_eq!(old, Some(Value::Literal("3".to_string())));
    assert!(store.get(concrete).unwrap().member(0).unwrap().is_written());
}
