//! The process-wide registry. Kept in its own test binary because it freezes
//! the shared instance.

use tagwire_core::{
    CodecError, DeclaredRecord, Fields, Record, RecordType, RegistrationError, Value, json,
};

#[derive(Debug, Clone, Default, PartialEq)]
struct Label {
    text: String,
}

impl Record for Label {
    fn attribute(&self, name: &str) -> Option<Value> {
        (name == "text").then(|| self.text.clone().into())
    }

    fn set_attribute(&mut self, name: &str, value: Value) -> Result<(), CodecError> {
        match name {
            "text" => self.text = Fields::new().with(name, value).take(name)?,
            _ => return Err(CodecError::no_such_attribute("Label", name)),
        }
        Ok(())
    }
}

impl DeclaredRecord for Label {
    fn record_type() -> Result<RecordType, RegistrationError> {
        RecordType::for_type::<Label>()
            .field("text")
            .from_fields(|mut fields| {
                Ok(Label {
                    text: fields.take("text")?,
                })
            })
            .build()
    }
}

#[test]
fn process_wide_registry() {
    let tuple = Value::tuple([Value::Int(1), Value::from("a")]);
    let text = json::dumps(&tuple).unwrap();
    assert_eq!(text, r#"{"__type__":"tuple","data":[1,"a"]}"#);
    assert_eq!(json::loads(&text).unwrap(), tuple);

    let label = Value::record(Label { text: "hi".into() });
    assert!(matches!(
        json::dumps(&label),
        Err(CodecError::UnsupportedType { .. })
    ));

    tagwire_core::register_record::<Label>().unwrap();
    assert_eq!(
        tagwire_core::register_record::<Label>().unwrap_err(),
        RegistrationError::DuplicateRecordName("Label".into())
    );
    let text = json::dumps(&label).unwrap();
    assert_eq!(text, r#"{"__type__":"record","__class__":"Label","text":"hi"}"#);
    assert_eq!(json::loads(&text).unwrap(), label);

    let mut streamed = Vec::new();
    json::dump(&label, &mut streamed).unwrap();
    assert_eq!(streamed, text.as_bytes());
    assert_eq!(json::load(streamed.as_slice()).unwrap(), label);

    #[cfg(feature = "msgpack")]
    {
        let bytes = tagwire_core::msgpack::dumps(&label).unwrap();
        assert_eq!(tagwire_core::msgpack::loads(&bytes).unwrap(), label);
        let mut streamed = Vec::new();
        tagwire_core::msgpack::dump(&label, &mut streamed).unwrap();
        assert_eq!(streamed, bytes);
        assert_eq!(tagwire_core::msgpack::load(streamed.as_slice()).unwrap(), label);
    }

    tagwire_core::freeze();
    assert!(tagwire_core::global().is_frozen());
    assert!(matches!(
        tagwire_core::register_record_type(
            "Late",
            RecordType::builder::<Label>("Late").default_constructor().build().unwrap()
        ),
        Err(RegistrationError::Frozen(_))
    ));
}
