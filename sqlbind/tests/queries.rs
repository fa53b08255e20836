//! End-to-end query tests over a real in-memory database.

use sqlbind::{
    impl_bind_struct, impl_from_row, impl_scalar_enum, Connection, Error, ErrorCode, OwnedValue,
    Rows, ToValue, Value,
};

fn seeded() -> Connection {
    let db = Connection::open_in_memory().unwrap();
    db.run(
        "CREATE TABLE user(id INTEGER PRIMARY KEY, name TEXT NOT NULL, age INTEGER);
         INSERT INTO user(id, name, age) VALUES
            (1, 'aaa', 31),
            (2, 'bbb2', 24),
            (3, 'ccc', 57),
            (4, 'aaa2', 12);",
        &(),
    )
    .unwrap();
    db
}

#[derive(Debug, PartialEq)]
struct User {
    id: i64,
    name: String,
    age: i64,
}

impl_from_row!(User { id, name, age });
impl_bind_struct!(User { id, name, age });

#[test]
fn scalar_round_trips() {
    let db = Connection::open_in_memory().unwrap();
    db.run("CREATE TABLE t(v)", &()).unwrap();

    db.run("INSERT INTO t VALUES (?)", &-42i64).unwrap();
    let back: i64 = db.get("SELECT v FROM t", &()).unwrap();
    assert_eq!(back, -42);

    db.run("DELETE FROM t", &()).unwrap();
    db.run("INSERT INTO t VALUES (?)", &1.5f64).unwrap();
    let back: f64 = db.get("SELECT v FROM t", &()).unwrap();
    assert_eq!(back, 1.5);

    db.run("DELETE FROM t", &()).unwrap();
    db.run("INSERT INTO t VALUES (?)", "hello").unwrap();
    let back: String = db.get("SELECT v FROM t", &()).unwrap();
    assert_eq!(back, "hello");

    db.run("DELETE FROM t", &()).unwrap();
    db.run("INSERT INTO t VALUES (?)", &true).unwrap();
    let back: bool = db.get("SELECT v FROM t", &()).unwrap();
    assert!(back);
}

#[test]
fn blob_round_trip_and_fixed_array_read() {
    let db = Connection::open_in_memory().unwrap();
    db.run("CREATE TABLE t(v BLOB)", &()).unwrap();
    let payload = vec![0xde, 0xad, 0xbe, 0xef];
    db.run("INSERT INTO t VALUES (?)", &payload).unwrap();

    let back: Vec<u8> = db.get("SELECT v FROM t", &()).unwrap();
    assert_eq!(back, payload);

    // Shorter column bytes fill the front of the array, rest zeroed.
    let arr: [u8; 8] = db.get("SELECT v FROM t", &()).unwrap();
    assert_eq!(arr, [0xde, 0xad, 0xbe, 0xef, 0, 0, 0, 0]);

    let err = db.get::<[u8; 2]>("SELECT v FROM t", &()).unwrap_err();
    assert!(matches!(err, Error::ValueTooLarge { capacity: 2, len: 4 }));
}

#[test]
fn oversized_u64_binds_as_decimal_text() {
    let db = Connection::open_in_memory().unwrap();
    db.run("CREATE TABLE t(v)", &()).unwrap();

    let big: u64 = 1 << 63;
    // The strict borrowing conversion refuses the value.
    assert!(matches!(big.to_value(), Err(Error::NumberTooLarge)));
    // The whole-set binder falls back to the owning conversion.
    db.run("INSERT INTO t VALUES (?)", &big).unwrap();

    let text: String = db.get("SELECT v FROM t", &()).unwrap();
    assert_eq!(text, "9223372036854775808");
    // Reading back into u64 parses the stored decimal text.
    let back: u64 = db.get("SELECT v FROM t", &()).unwrap();
    assert_eq!(back, big);
}

#[test]
fn tuple_and_named_parameter_binding() {
    let db = seeded();
    db.run(
        "INSERT INTO user(id, name, age) VALUES (?, ?, ?)",
        &(5i64, "sauce", 99i64),
    )
    .unwrap();
    let name: String = db
        .get("SELECT name FROM user WHERE id = ?", &5i64)
        .unwrap();
    assert_eq!(name, "sauce");

    db.run(
        "UPDATE user SET age = :amount WHERE name = :name",
        &User {
            id: 0,
            name: "sauce".to_string(),
            age: 0,
        },
    )
    .unwrap();
    // :amount has no matching field and stays null.
    let age: Option<i64> = db
        .get("SELECT age FROM user WHERE name = ?", "sauce")
        .unwrap();
    assert_eq!(age, None);
}

#[test]
fn record_bind_and_read() {
    let db = seeded();
    let u = User {
        id: 6,
        name: "dee".to_string(),
        age: 48,
    };
    db.run(
        "INSERT INTO user(id, name, age) VALUES (:id, :name, :age)",
        &u,
    )
    .unwrap();

    let back: User = db
        .get("SELECT id, name, age FROM user WHERE id = :id", &6i64)
        .unwrap();
    assert_eq!(back, u);

    // Column order does not matter for record reads.
    let back: User = db
        .get("SELECT age, id, name FROM user WHERE id = :id", &6i64)
        .unwrap();
    assert_eq!(back, u);
}

#[derive(Debug, PartialEq)]
struct UserRef<'a> {
    id: i64,
    name: &'a str,
}

impl_from_row!(UserRef<'a> { id, name });

#[test]
fn borrowing_record_reads_through_lending_cursor() {
    let db = seeded();
    let mut rows: Rows<'_, '_, ()> = db
        .execute("SELECT id, name FROM user WHERE name LIKE 'a%' ORDER BY name", &())
        .unwrap();
    let mut names = Vec::new();
    while let Some(row) = rows.next_row().unwrap() {
        let user: UserRef<'_> = row.decode().unwrap();
        names.push((user.id, user.name.to_string()));
    }
    assert_eq!(
        names,
        vec![(1, "aaa".to_string()), (4, "aaa2".to_string())]
    );
}

#[derive(Debug, PartialEq)]
struct Profile {
    name: String,
    bio: String,
}

impl_from_row!(Profile {
    name,
    bio = String::from("n/a")
});

#[test]
fn record_field_defaults_and_undefined_field() {
    let db = seeded();
    let p: Profile = db
        .get("SELECT name FROM user WHERE id = 1", &())
        .unwrap();
    assert_eq!(
        p,
        Profile {
            name: "aaa".to_string(),
            bio: "n/a".to_string()
        }
    );

    // A defaultless field with no matching column is rejected.
    let err = db
        .get::<User>("SELECT id, name FROM user WHERE id = 1", &())
        .unwrap_err();
    match err {
        Error::UndefinedField { field, target } => {
            assert_eq!(field, "age");
            assert_eq!(target, "User");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
enum Role {
    Admin,
    Member,
    Guest,
}

impl_scalar_enum!(Role {
    Admin = 0,
    Member = 1,
    Guest = 2,
});

#[test]
fn enum_members_marshal_as_integers() {
    let db = Connection::open_in_memory().unwrap();
    db.run("CREATE TABLE grant_row(role INTEGER)", &()).unwrap();
    db.run("INSERT INTO grant_row VALUES (?)", &Role::Member)
        .unwrap();

    let raw: i64 = db.get("SELECT role FROM grant_row", &()).unwrap();
    assert_eq!(raw, 1);
    let role: Role = db.get("SELECT role FROM grant_row", &()).unwrap();
    assert_eq!(role, Role::Member);

    let err = db.get::<Role>("SELECT 9", &()).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidValue { value: 9, target: "Role" }
    ));
}

#[test]
fn option_distinguishes_null_from_zero() {
    let db = Connection::open_in_memory().unwrap();
    db.run("CREATE TABLE t(v INTEGER)", &()).unwrap();
    db.run("INSERT INTO t VALUES (NULL), (0)", &()).unwrap();

    let vals: Vec<Option<i64>> = {
        let mut rows = db
            .execute("SELECT v FROM t ORDER BY rowid", &())
            .unwrap();
        let mut out = Vec::new();
        while let Some(v) = rows.next() {
            out.push(v.unwrap());
        }
        out
    };
    assert_eq!(vals, vec![None, Some(0)]);

    // Binding None stores an engine null.
    db.run("INSERT INTO t VALUES (?)", &Option::<i64>::None)
        .unwrap();
    let stored: Option<i64> = db
        .get("SELECT v FROM t WHERE rowid = 3", &())
        .unwrap();
    assert_eq!(stored, None);
}

#[test]
fn dynamic_values_read_any_storage_class() {
    let db = seeded();
    let mut rows: Rows<'_, '_, ()> = db
        .execute("SELECT id, name, NULL, 0.5, x'ff' FROM user WHERE id = 1", &())
        .unwrap();
    let row = rows.next_row().unwrap().unwrap();
    assert!(matches!(row.value(0).unwrap(), Value::Integer(1)));
    assert!(matches!(row.value(1).unwrap(), Value::Text("aaa")));
    assert!(matches!(row.value(2).unwrap(), Value::Null));
    assert!(matches!(row.value(3).unwrap(), Value::Float(_)));
    assert!(matches!(row.value(4).unwrap(), Value::Blob(&[0xff])));

    let owned: OwnedValue = row.get(1).unwrap();
    assert_eq!(owned, OwnedValue::Text("aaa".to_string()));
}

#[test]
fn filtered_typed_query_preserves_order() {
    let db = seeded();
    // A named parameter still occupies slot 1, so a scalar binds it.
    let mut rows: Rows<'_, '_, (i64, String)> = db
        .execute(
            "SELECT id, name FROM user WHERE name LIKE :pattern ORDER BY name",
            "a%",
        )
        .unwrap();
    let mut seen = Vec::new();
    while let Some(row) = rows.next() {
        seen.push(row.unwrap());
    }
    assert_eq!(
        seen,
        vec![(1, "aaa".to_string()), (4, "aaa2".to_string())]
    );
}

#[test]
fn get_and_get_optional_agree_on_no_rows() {
    let db = seeded();
    let err = db
        .get::<String>("SELECT name FROM user WHERE id = 99", &())
        .unwrap_err();
    assert!(matches!(err, Error::NoResult));
    let none = db
        .get_optional::<String>("SELECT name FROM user WHERE id = 99", &())
        .unwrap();
    assert!(none.is_none());
}

#[test]
fn multi_statement_run_and_laziness() {
    let db = seeded();
    // All three statements execute.
    db.run(
        "DELETE FROM user WHERE id = 4;
         INSERT INTO user(id, name, age) VALUES (7, 'late', 1);
         UPDATE user SET age = 2 WHERE id = 7;",
        &(),
    )
    .unwrap();
    let age: i64 = db
        .get("SELECT age FROM user WHERE id = 7", &())
        .unwrap();
    assert_eq!(age, 2);

    // first_or_none over three statements never prepares the third,
    // so its syntax error is never observed.
    let got: Option<i64> = db
        .get_optional(
            "UPDATE user SET age = 3 WHERE id = 7;
             SELECT age FROM user WHERE id = 7;
             SELECT THIS IS NOT SQL;",
            &(),
        )
        .unwrap();
    assert_eq!(got, Some(3));
}

#[test]
fn error_taxonomy_surfaces_engine_codes() {
    let db = seeded();
    let err = db
        .run("INSERT INTO user(id, name, age) VALUES (1, 'dup', 0)", &())
        .unwrap_err();
    match err {
        Error::Sqlite { code, message } => {
            assert_eq!(code.primary(), ErrorCode::Constraint);
            assert!(message.contains("UNIQUE"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = db.run("SELECT definitely not sql", &()).unwrap_err();
    match err {
        Error::Sqlite { code, .. } => assert_eq!(code.primary(), ErrorCode::Error),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn cursor_dispose_is_idempotent_and_total() {
    let db = seeded();
    let mut rows: Rows<'_, '_, i64> = db
        .execute("SELECT id FROM user; SELECT age FROM user;", &())
        .unwrap();
    assert!(rows.next().is_some());
    rows.dispose().unwrap();
    rows.dispose().unwrap();
    assert!(rows.next().is_none());
}
