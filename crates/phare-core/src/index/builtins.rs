//! Built-in PHP base types seeded into every project index
//!
//! A handful of engine-defined classes and interfaces that user code extends
//! without declaring anywhere. Config `[stubs]` adds project-specific ones on
//! top.

use crate::config::StubsConfig;
use crate::index::facts::ClassFact;
use crate::names::QualifiedName;
use crate::tree::ClassKind;

fn global(name: &str) -> QualifiedName {
    QualifiedName::global(name)
}

/// Parses a config stub name like `App\Generated\Model` into a qualified
/// name. Empty strings are skipped by the caller.
fn parse_name(text: &str) -> Option<QualifiedName> {
    QualifiedName::new(text.split('\\').filter(|s| !s.is_empty())).ok()
}

pub fn builtin_facts(stubs: &StubsConfig) -> Vec<ClassFact> {
    let mut facts = vec![
        // Error hierarchy.
        ClassFact::stub(global("Throwable"), ClassKind::Interface)
            .with_interface(global("Stringable")),
        ClassFact::stub(global("Exception"), ClassKind::Class)
            .with_interface(global("Throwable")),
        ClassFact::stub(global("Error"), ClassKind::Class).with_interface(global("Throwable")),
        ClassFact::stub(global("RuntimeException"), ClassKind::Class)
            .with_superclass(global("Exception")),
        ClassFact::stub(global("LogicException"), ClassKind::Class)
            .with_superclass(global("Exception")),
        ClassFact::stub(global("InvalidArgumentException"), ClassKind::Class)
            .with_superclass(global("LogicException")),
        ClassFact::stub(global("TypeError"), ClassKind::Class).with_superclass(global("Error")),
        ClassFact::stub(global("ValueError"), ClassKind::Class).with_superclass(global("Error")),
        // Iteration and container interfaces.
        ClassFact::stub(global("Traversable"), ClassKind::Interface),
        ClassFact::stub(global("Iterator"), ClassKind::Interface)
            .with_interface(global("Traversable")),
        ClassFact::stub(global("IteratorAggregate"), ClassKind::Interface)
            .with_interface(global("Traversable")),
        ClassFact::stub(global("ArrayAccess"), ClassKind::Interface),
        ClassFact::stub(global("Countable"), ClassKind::Interface),
        ClassFact::stub(global("JsonSerializable"), ClassKind::Interface),
        ClassFact::stub(global("Stringable"), ClassKind::Interface),
        // Enums.
        ClassFact::stub(global("UnitEnum"), ClassKind::Interface),
        ClassFact::stub(global("BackedEnum"), ClassKind::Interface)
            .with_interface(global("UnitEnum")),
        ClassFact::stub(global("stdClass"), ClassKind::Class),
    ];

    for class in &stubs.classes {
        if let Some(name) = parse_name(class) {
            facts.push(ClassFact::stub(name, ClassKind::Class));
        }
    }
    for interface in &stubs.interfaces {
        if let Some(name) = parse_name(interface) {
            facts.push(ClassFact::stub(name, ClassKind::Interface));
        }
    }
    for (child, parent) in &stubs.extends {
        let (Some(child), Some(parent)) = (parse_name(child), parse_name(parent)) else {
            continue;
        };
        if let Some(fact) = facts.iter_mut().find(|f| f.name == child) {
            fact.superclass = Some(parent);
        } else {
            facts.push(ClassFact::stub(child, ClassKind::Class).with_superclass(parent));
        }
    }

    facts
}
