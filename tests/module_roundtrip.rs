use std::io::Cursor;

use rdbcodec::{
    Decoder, Encoder, ModuleOpcode, ModuleRead, RdbError, RdbResult, Record, WriteOptions,
};

/// Значение демонстрационного модульного типа.
#[derive(Debug, PartialEq)]
struct Rating {
    count: u64,
    label: Vec<u8>,
    mean: f64,
}

const TYPE_NAME: &str = "ratings-1";

fn read_rating(r: &mut dyn ModuleRead) -> RdbResult<Rating> {
    let expect = |r: &mut dyn ModuleRead, want: ModuleOpcode| -> RdbResult<()> {
        let got = r.read_opcode()?;
        if got != want {
            return Err(RdbError::Encode(format!("expected {want:?}, got {got:?}")));
        }
        Ok(())
    };
    expect(r, ModuleOpcode::UInt)?;
    let count = r.read_uint()?;
    expect(r, ModuleOpcode::String)?;
    let label = r.read_string()?;
    expect(r, ModuleOpcode::Double)?;
    let mean = r.read_double()?;
    Ok(Rating { count, label, mean })
}

fn encode_rating(rating: &Rating) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    enc.write_header().unwrap();
    enc.write_db_header(0, 1, 0).unwrap();
    enc.write_module_object(b"score", TYPE_NAME, 2, &WriteOptions::new(), |w| {
        w.write_uint(rating.count)?;
        w.write_string(&rating.label)?;
        w.write_double(rating.mean)
    })
    .unwrap();
    enc.write_end().unwrap();
    buf
}

#[test]
fn test_module_roundtrip_with_handler() {
    let rating = Rating {
        count: 17,
        label: b"films".to_vec(),
        mean: 4.25,
    };
    let buf = encode_rating(&rating);

    let mut found = false;
    let mut dec = Decoder::new(Cursor::new(buf))
        .with_module_handler(TYPE_NAME, |r, enc_version| {
            assert_eq!(enc_version, 2);
            Ok(Box::new(read_rating(r)?))
        });
    dec.parse(|record| {
        if let Record::Module {
            name,
            enc_version,
            value,
            ..
        } = &record
        {
            assert_eq!(name, TYPE_NAME);
            assert_eq!(*enc_version, 2);
            let got = value.as_any().downcast_ref::<Rating>().unwrap();
            assert_eq!(
                got,
                &Rating {
                    count: 17,
                    label: b"films".to_vec(),
                    mean: 4.25,
                }
            );
            found = true;
        }
        true
    })
    .unwrap();
    assert!(found);
}

#[test]
fn test_unknown_module_is_error_by_default() {
    let buf = encode_rating(&Rating {
        count: 1,
        label: b"x".to_vec(),
        mean: 0.0,
    });
    let mut dec = Decoder::new(Cursor::new(buf));
    let err = dec.parse(|_| true).unwrap_err();
    assert!(matches!(err, RdbError::Format { .. }));
}

#[test]
fn test_lenient_mode_skips_unknown_module() {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    enc.write_header().unwrap();
    enc.write_db_header(0, 2, 0).unwrap();
    enc.write_module_object(b"score", TYPE_NAME, 1, &WriteOptions::new(), |w| {
        w.write_sint(-3)?;
        w.write_float(1.5)
    })
    .unwrap();
    // Запись после модуля должна читаться как ни в чём не бывало.
    enc.write_string_object(b"after", b"ok", &WriteOptions::new())
        .unwrap();
    enc.write_end().unwrap();

    let mut keys = Vec::new();
    let mut dec = Decoder::new(Cursor::new(buf)).skip_unknown_modules(true);
    dec.parse(|record| {
        if let Some(key) = record.key() {
            keys.push(key.to_vec());
        }
        true
    })
    .unwrap();
    assert_eq!(keys, vec![b"after".to_vec()]);
}

#[test]
fn test_handler_must_consume_whole_value() {
    let buf = encode_rating(&Rating {
        count: 5,
        label: b"y".to_vec(),
        mean: 2.0,
    });
    // Обработчик бросает чтение на середине: хвост значения остаётся
    // в потоке, и разбор обязан упасть на проверке EOF.
    let mut dec = Decoder::new(Cursor::new(buf)).with_module_handler(TYPE_NAME, |r, _| {
        let _ = r.read_opcode()?;
        let count = r.read_uint()?;
        Ok(Box::new(count))
    });
    assert!(dec.parse(|_| true).is_err());
}
