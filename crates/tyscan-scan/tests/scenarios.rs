//! End-to-end scan scenarios over a multi-package export.

use serde_json::json;
use tyscan_common::ScanMode;
use tyscan_front::{
    BasicKind, Decl, FieldDesc, FrontendExport, GroupDecl, Package, SourceFile, TypeDecl,
    TypeTable, ValueSpec,
};
use tyscan_scan::{ScanConfig, Scanner};

/// Two packages: `example.com/shop` (scanned root) and
/// `example.com/money` (dependency, distance 1). The shop declares an
/// alias into the dependency, a generic pair, an instantiation of it,
/// and an enum-like constant group.
fn shop_export() -> FrontendExport {
    let mut table = TypeTable::new();
    let string = table.basic(BasicKind::String);
    let int = table.basic(BasicKind::Int);
    let comparable = table.basic(BasicKind::Comparable);
    let any = table.basic(BasicKind::Any);

    // package money: type Amount int64
    let int64 = table.basic(BasicKind::Int64);
    let amount = table.named("example.com/money", "Amount", int64);

    // package shop:
    // type Price = Amount
    let price = table.alias("example.com/shop", "Price", amount);
    // type Pair[K comparable, V any] struct { Key K; Value V }
    let pair = table.declare_named("example.com/shop", "Pair");
    let k = table.type_param(0, "K", comparable);
    let v = table.type_param(1, "V", any);
    let pair_body = table.strukt(vec![FieldDesc::new("Key", k), FieldDesc::new("Value", v)]);
    table.set_underlying(pair, pair_body);
    table.set_type_params(pair, vec![k, v]);
    // type Listing Pair[string, Amount] (named with an instantiated
    // underlying is simplified here to the instantiation itself)
    let listing = table.instantiate(pair, vec![string, amount]);
    // type Currency int with enum-like constants
    let currency = table.named("example.com/shop", "Currency", int);

    let mut money = Package::new("example.com/money", "money");
    money.distance = 1;
    let mut money_file = SourceFile::new("amount.go");
    money_file
        .doc
        .push("Package money models currency amounts.".to_string());
    let mut amount_decl = TypeDecl::new("Amount", amount);
    amount_decl
        .doc
        .push("Amount is a fixed-point currency value.".to_string());
    money_file.decls.push(Decl::Type(amount_decl));
    money.files.push(money_file);

    let mut shop = Package::new("example.com/shop", "shop");
    shop.imports.push("example.com/money".to_string());
    let mut shop_file = SourceFile::new("shop.go");
    shop_file.doc.push("Package shop lists items.".to_string());
    shop_file.decls.push(Decl::Type(TypeDecl::new("Price", price)));
    shop_file.decls.push(Decl::Type(TypeDecl::new("Pair", pair)));
    shop_file
        .decls
        .push(Decl::Type(TypeDecl::new("Listing", listing)));
    shop_file
        .decls
        .push(Decl::Type(TypeDecl::new("Currency", currency)));
    shop_file.decls.push(Decl::Const(GroupDecl {
        doc: vec!["Supported currencies.".to_string()],
        specs: vec![
            ValueSpec::single("EUR", Some(currency), "0"),
            ValueSpec::single("USD", Some(currency), "1"),
        ],
    }));
    shop.files.push(shop_file);

    FrontendExport::new(table, vec![shop, money])
}

fn scan(mode: ScanMode) -> serde_json::Value {
    let mut scanner = Scanner::new(ScanConfig {
        packages: vec!["example.com/shop".to_string()],
        mode,
        include_unexported: false,
    });
    scanner.scan(&shop_export()).unwrap().snapshot()
}

#[test]
fn test_cross_package_alias_and_distance() {
    let snapshot = scan(ScanMode::DEFAULT);

    // Single-hop alias: Price points at money.Amount by reference.
    let price = &snapshot["types"]["example.com/shop.Price"];
    assert_eq!(price["kind"], "alias");
    assert_eq!(
        price["underlying"],
        json!({"$ref": "example.com/money.Amount"})
    );

    // The dependency type was pulled in with its distance.
    let amount = &snapshot["types"]["example.com/money.Amount"];
    assert_eq!(amount["kind"], "basic");
    assert_eq!(amount["distance"], 1);
    assert_eq!(amount["underlying"], json!({"$ref": "int64"}));

    // Only the scanned root package carries distance 0.
    let shop_pkg = &snapshot["packages"]["example.com/shop"];
    assert_eq!(shop_pkg["distance"], 0);
}

#[test]
fn test_generic_pair_and_instantiation_in_snapshot() {
    let snapshot = scan(ScanMode::DEFAULT);

    let pair = &snapshot["types"]["example.com/shop.Pair"];
    assert_eq!(pair["kind"], "struct");
    let params = pair["type_params"].as_array().unwrap();
    assert_eq!(params.len(), 2);
    assert_eq!(params[0]["name"], "K");
    assert_eq!(params[0]["constraint"], json!({"$ref": "comparable"}));
    assert_eq!(params[1]["constraint"], json!({"$ref": "any"}));
    // The origin keeps its placeholders.
    assert_eq!(pair["fields"][0]["type"]["kind"], "type_parameter");

    let listing = &snapshot["types"]
        ["example.com/shop.Pair[string,example.com/money.Amount]"];
    assert_eq!(listing["kind"], "instantiated");
    assert_eq!(listing["origin"], "example.com/shop.Pair");
    assert_eq!(listing["type_args"][1]["type"], json!({"$ref": "example.com/money.Amount"}));
    // Substitution rewrote both fields.
    assert_eq!(listing["fields"][0]["type"], json!({"$ref": "string"}));
    assert_eq!(
        listing["fields"][1]["type"],
        json!({"$ref": "example.com/money.Amount"})
    );
}

#[test]
fn test_enum_constants_and_package_docs() {
    let snapshot = scan(ScanMode::DEFAULT);

    let eur = &snapshot["values"]["example.com/shop.EUR"];
    assert_eq!(eur["kind"], "const");
    assert_eq!(eur["value"], "0");
    assert_eq!(eur["parent"], json!({"$ref": "example.com/shop.Currency"}));
    assert_eq!(eur["comments"][0]["text"], "Supported currencies.");

    let shop_pkg = &snapshot["packages"]["example.com/shop"];
    assert_eq!(
        shop_pkg["comments"]["#PACKAGE_DOC"][0]["text"],
        "Package shop lists items."
    );
}

#[test]
fn test_dependency_docs_load_lazily() {
    // Without the docs bit, the dependency entity has no comments even
    // though its package carries them.
    let without = scan(ScanMode::DEFAULT);
    assert_eq!(
        without["types"]["example.com/money.Amount"]["comments"]
            .as_array()
            .unwrap()
            .len(),
        0
    );

    let with = scan(ScanMode::DEFAULT | ScanMode::DOCS);
    assert_eq!(
        with["types"]["example.com/money.Amount"]["comments"][0]["text"],
        "Amount is a fixed-point currency value."
    );
}

#[test]
fn test_snapshot_bytes_identical_across_runs() {
    let first = serde_json::to_vec(&scan(ScanMode::DEFAULT)).unwrap();
    let second = serde_json::to_vec(&scan(ScanMode::DEFAULT)).unwrap();
    assert_eq!(first, second);
}
