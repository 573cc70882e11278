use std::io::Cursor;

use rand::RngCore;
use rdbcodec::{Decoder, Encoder, Encoding, RdbError, Record, WriteOptions, ZSetEntry};

/// Собирает дамп замыканием и разбирает его обратно в записи.
fn roundtrip<F>(build: F) -> Vec<Record>
where
    F: FnOnce(&mut Encoder<&mut Vec<u8>>),
{
    let buf = encode(build);
    decode(&buf).unwrap()
}

fn encode<F>(build: F) -> Vec<u8>
where
    F: FnOnce(&mut Encoder<&mut Vec<u8>>),
{
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    enc.write_header().unwrap();
    enc.write_db_header(0, 0, 0).unwrap();
    build(&mut enc);
    enc.write_end().unwrap();
    buf
}

fn decode(buf: &[u8]) -> Result<Vec<Record>, RdbError> {
    let mut records = Vec::new();
    let mut dec = Decoder::new(Cursor::new(buf.to_vec()));
    dec.parse(|record| {
        records.push(record);
        true
    })?;
    Ok(records)
}

/// Ключевые записи без служебных (AUX, RESIZEDB).
fn keyed(records: Vec<Record>) -> Vec<Record> {
    records.into_iter().filter(|r| r.base().is_some()).collect()
}

#[test]
fn test_string_roundtrip() {
    let records = keyed(roundtrip(|enc| {
        let opts = WriteOptions::new();
        enc.write_string_object(b"plain", b"hello", &opts).unwrap();
        enc.write_string_object(b"empty", b"", &opts).unwrap();
        enc.write_string_object(b"int", b"-12345", &opts).unwrap();
        enc.write_string_object(b"noncanon", b"007", &opts).unwrap();
    }));
    assert_eq!(records.len(), 4);
    let expected: [&[u8]; 4] = [b"hello", b"", b"-12345", b"007"];
    for (record, want) in records.iter().zip(expected) {
        match record {
            Record::String { value, .. } => assert_eq!(value.as_slice(), want),
            other => panic!("expected string, got {other:?}"),
        }
    }
}

#[test]
fn test_compressed_string_roundtrip() {
    // Повторяющиеся данные сжимаются, случайные остаются сырыми.
    let compressible = b"abcabcabc".repeat(50);
    let mut random = vec![0u8; 500];
    rand::thread_rng().fill_bytes(&mut random);

    let records = keyed(roundtrip(|enc| {
        let opts = WriteOptions::new();
        enc.write_string_object(b"zip", &compressible, &opts).unwrap();
        enc.write_string_object(b"rand", &random, &opts).unwrap();
    }));
    match (&records[0], &records[1]) {
        (Record::String { value: a, .. }, Record::String { value: b, .. }) => {
            assert_eq!(*a, compressible);
            assert_eq!(*b, random);
        }
        other => panic!("expected strings, got {other:?}"),
    }
}

#[test]
fn test_ttl_applies_to_one_key_only() {
    let records = keyed(roundtrip(|enc| {
        enc.write_string_object(b"k1", b"v1", &WriteOptions::new().ttl_ms(1_750_000_000_000))
            .unwrap();
        enc.write_string_object(b"k2", b"v2", &WriteOptions::new())
            .unwrap();
    }));
    assert_eq!(
        records[0].base().unwrap().expire_ms,
        Some(1_750_000_000_000)
    );
    assert_eq!(records[1].base().unwrap().expire_ms, None);
}

#[test]
fn test_aux_and_db_size_are_surfaced() {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    enc.write_header().unwrap();
    enc.write_aux(b"redis-ver", b"7.2.0").unwrap();
    enc.write_db_header(2, 10, 3).unwrap();
    enc.write_string_object(b"k", b"v", &WriteOptions::new())
        .unwrap();
    enc.write_end().unwrap();

    let records = decode(&buf).unwrap();
    assert!(matches!(
        &records[0],
        Record::Aux { key, value } if key == b"redis-ver" && value == b"7.2.0"
    ));
    assert!(matches!(
        records[1],
        Record::DbSize {
            db: 2,
            key_count: 10,
            ttl_count: 3,
        }
    ));
    assert_eq!(records[2].base().unwrap().db, 2);
}

#[test]
fn test_small_list_uses_ziplist() {
    let values: Vec<Vec<u8>> = vec![b"a".to_vec(), b"42".to_vec(), b"-7".to_vec()];
    let records = keyed(roundtrip(|enc| {
        enc.write_list_object(b"l", &values, &WriteOptions::new())
            .unwrap();
    }));
    match &records[0] {
        Record::List { base, values: got } => {
            assert_eq!(base.encoding, Encoding::ZipList);
            assert_eq!(*got, values);
        }
        other => panic!("expected list, got {other:?}"),
    }
}

#[test]
fn test_large_list_uses_quicklist() {
    let values: Vec<Vec<u8>> = (0..1000).map(|i| format!("value-{i}").into_bytes()).collect();
    let records = keyed(roundtrip(|enc| {
        enc.write_list_object(b"l", &values, &WriteOptions::new())
            .unwrap();
    }));
    match &records[0] {
        Record::List { base, values: got } => {
            assert_eq!(base.encoding, Encoding::QuickList);
            assert_eq!(*got, values);
        }
        other => panic!("expected list, got {other:?}"),
    }
}

#[test]
fn test_long_value_forces_plain_list_form() {
    let values: Vec<Vec<u8>> = vec![vec![b'x'; 100], b"short".to_vec()];
    let records = keyed(roundtrip(|enc| {
        enc.write_list_object(b"l", &values, &WriteOptions::new())
            .unwrap();
    }));
    match &records[0] {
        Record::List { base, values: got } => {
            assert_eq!(base.encoding, Encoding::QuickList);
            assert_eq!(*got, values);
        }
        other => panic!("expected list, got {other:?}"),
    }
}

#[test]
fn test_hash_roundtrip_both_forms() {
    let small: Vec<(Vec<u8>, Vec<u8>)> = vec![
        (b"name".to_vec(), b"alice".to_vec()),
        (b"age".to_vec(), b"30".to_vec()),
    ];
    let big: Vec<(Vec<u8>, Vec<u8>)> = (0..200)
        .map(|i| (format!("f{i}").into_bytes(), format!("v{i}").into_bytes()))
        .collect();
    let records = keyed(roundtrip(|enc| {
        let opts = WriteOptions::new();
        enc.write_hash_object(b"small", &small, &opts).unwrap();
        enc.write_hash_object(b"big", &big, &opts).unwrap();
    }));
    match (&records[0], &records[1]) {
        (
            Record::Hash {
                base: b1,
                fields: f1,
            },
            Record::Hash {
                base: b2,
                fields: f2,
            },
        ) => {
            assert_eq!(b1.encoding, Encoding::ZipList);
            assert_eq!(*f1, small);
            assert_eq!(b2.encoding, Encoding::Plain);
            assert_eq!(*f2, big);
        }
        other => panic!("expected hashes, got {other:?}"),
    }
}

#[test]
fn test_integer_set_uses_intset_and_sorts() {
    let members: Vec<Vec<u8>> = vec![b"300".to_vec(), b"-5".to_vec(), b"7".to_vec()];
    let records = keyed(roundtrip(|enc| {
        enc.write_set_object(b"s", &members, &WriteOptions::new())
            .unwrap();
    }));
    match &records[0] {
        Record::Set { base, members: got } => {
            assert_eq!(base.encoding, Encoding::IntSet);
            // intset хранит элементы по возрастанию
            assert_eq!(
                *got,
                vec![b"-5".to_vec(), b"7".to_vec(), b"300".to_vec()]
            );
        }
        other => panic!("expected set, got {other:?}"),
    }
}

#[test]
fn test_mixed_set_stays_plain() {
    let members: Vec<Vec<u8>> = vec![b"1".to_vec(), b"two".to_vec()];
    let records = keyed(roundtrip(|enc| {
        enc.write_set_object(b"s", &members, &WriteOptions::new())
            .unwrap();
    }));
    match &records[0] {
        Record::Set { base, members: got } => {
            assert_eq!(base.encoding, Encoding::Plain);
            assert_eq!(*got, members);
        }
        other => panic!("expected set, got {other:?}"),
    }
}

#[test]
fn test_zset_roundtrip_both_forms() {
    let small = vec![
        ZSetEntry {
            member: b"a".to_vec(),
            score: 1.5,
        },
        ZSetEntry {
            member: b"b".to_vec(),
            score: -2.0,
        },
    ];
    let with_inf = vec![
        ZSetEntry {
            member: b"low".to_vec(),
            score: f64::NEG_INFINITY,
        },
        ZSetEntry {
            member: b"high".to_vec(),
            score: f64::INFINITY,
        },
    ];
    let records = keyed(roundtrip(|enc| {
        let opts = WriteOptions::new();
        enc.write_zset_object(b"small", &small, &opts).unwrap();
        // Бесконечные оценки не помещаются в компактную форму.
        enc.write_zset_object(b"inf", &with_inf, &opts).unwrap();
    }));
    match (&records[0], &records[1]) {
        (
            Record::SortedSet {
                base: b1,
                entries: e1,
            },
            Record::SortedSet {
                base: b2,
                entries: e2,
            },
        ) => {
            assert_eq!(b1.encoding, Encoding::ZipList);
            assert_eq!(*e1, small);
            assert_eq!(b2.encoding, Encoding::Plain);
            assert_eq!(*e2, with_inf);
        }
        other => panic!("expected sorted sets, got {other:?}"),
    }
}

#[test]
fn test_compact_threshold_overrides() {
    let values: Vec<Vec<u8>> = (0..10).map(|i| format!("v{i}").into_bytes()).collect();
    let records = keyed(roundtrip(|enc| {
        enc.write_list_object(b"l", &values, &WriteOptions::new().compact_max_entries(5))
            .unwrap();
    }));
    assert_eq!(records[0].base().unwrap().encoding, Encoding::QuickList);
}

#[test]
fn test_size_covers_key_and_value() {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf).with_compression(false);
    enc.write_header().unwrap();
    enc.write_db_header(0, 1, 0).unwrap();
    enc.write_string_object(b"key", b"a longer value than the key", &WriteOptions::new())
        .unwrap();
    enc.write_end().unwrap();

    // Вне ключа и значения лежат: заголовок (9), заголовок базы (5),
    // типовой байт (1), EOF (1) и хвост (8).
    let expected = buf.len() as u64 - 24;
    let records = keyed(decode(&buf).unwrap());
    assert_eq!(records[0].base().unwrap().size, expected);
}

#[test]
fn test_callback_false_stops_cleanly() {
    let buf = encode(|enc| {
        let opts = WriteOptions::new();
        enc.write_string_object(b"k1", b"v1", &opts).unwrap();
        enc.write_string_object(b"k2", b"v2", &opts).unwrap();
    });
    let mut seen = 0;
    let mut dec = Decoder::new(Cursor::new(buf));
    dec.parse(|record| {
        if record.base().is_none() {
            return true;
        }
        seen += 1;
        false
    })
    .unwrap();
    assert_eq!(seen, 1);
}

#[test]
fn test_corrupted_checksum_is_detected() {
    let mut buf = encode(|enc| {
        enc.write_string_object(b"k", b"v", &WriteOptions::new())
            .unwrap();
    });
    let last = buf.len() - 1;
    buf[last] ^= 0xff;
    assert!(matches!(
        decode(&buf).unwrap_err(),
        RdbError::Checksum { .. }
    ));
}

#[test]
fn test_zeroed_trailer_is_accepted() {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf).with_checksum(false);
    enc.write_header().unwrap();
    enc.write_db_header(0, 0, 0).unwrap();
    enc.write_string_object(b"k", b"v", &WriteOptions::new())
        .unwrap();
    enc.write_end().unwrap();
    assert_eq!(keyed(decode(&buf).unwrap()).len(), 1);
}

#[test]
fn test_old_version_roundtrip_without_trailer() {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf).with_version(4);
    enc.write_header().unwrap();
    enc.write_db_header(0, 0, 0).unwrap();
    enc.write_string_object(b"k", b"v", &WriteOptions::new())
        .unwrap();
    enc.write_end().unwrap();
    assert_eq!(keyed(decode(&buf).unwrap()).len(), 1);
}

#[test]
fn test_truncated_dump_is_error() {
    let buf = encode(|enc| {
        enc.write_string_object(b"k", b"value", &WriteOptions::new())
            .unwrap();
    });
    let cut = &buf[..buf.len() - 12];
    assert!(matches!(
        decode(cut).unwrap_err(),
        RdbError::Truncated { .. }
    ));
}

#[test]
fn test_long_string_uses_32bit_length_form() {
    // 20000 байт не помещаются в 14-битную длину; без сжатия значение
    // проходит через 32-битную форму целиком.
    let mut value = vec![0u8; 20_000];
    rand::thread_rng().fill_bytes(&mut value);

    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf).with_compression(false);
    enc.write_header().unwrap();
    enc.write_db_header(0, 1, 0).unwrap();
    enc.write_string_object(b"big", &value, &WriteOptions::new())
        .unwrap();
    enc.write_end().unwrap();

    let records = keyed(decode(&buf).unwrap());
    match &records[0] {
        Record::String { value: got, .. } => assert_eq!(*got, value),
        other => panic!("expected string, got {other:?}"),
    }
}

#[test]
fn test_zset_with_huge_finite_scores_roundtrips() {
    // 65 элементов выталкивают множество в обычную форму с текстовыми
    // оценками; 1e300 обязан пережить её без потери байта длины.
    let entries: Vec<ZSetEntry> = (0..65)
        .map(|i| ZSetEntry {
            member: format!("m{i}").into_bytes(),
            score: if i == 0 { 1e300 } else { i as f64 },
        })
        .collect();
    let records = keyed(roundtrip(|enc| {
        enc.write_zset_object(b"z", &entries, &WriteOptions::new())
            .unwrap();
    }));
    match &records[0] {
        Record::SortedSet { entries: got, .. } => assert_eq!(*got, entries),
        other => panic!("expected sorted set, got {other:?}"),
    }
}

#[test]
fn test_huge_claimed_list_length_fails_without_panic() {
    let mut buf = b"REDIS0009".to_vec();
    buf.extend_from_slice(&[254, 0]); // SELECTDB
    buf.push(1); // список
    buf.extend_from_slice(&[1, b'k']);
    buf.push(0x81);
    buf.extend_from_slice(&(1u64 << 63).to_be_bytes());
    assert!(matches!(
        decode(&buf).unwrap_err(),
        RdbError::Truncated { .. }
    ));
}

#[test]
fn test_huge_claimed_string_length_fails_without_panic() {
    let mut buf = b"REDIS0009".to_vec();
    buf.extend_from_slice(&[254, 0]);
    buf.push(0); // строка
    buf.extend_from_slice(&[1, b'k']);
    buf.push(0x81);
    buf.extend_from_slice(&(u64::MAX).to_be_bytes());
    assert!(matches!(
        decode(&buf).unwrap_err(),
        RdbError::Truncated { .. }
    ));
}

#[test]
fn test_unknown_type_byte_is_error() {
    let mut buf = b"REDIS0009".to_vec();
    buf.push(254); // SELECTDB
    buf.push(0);
    buf.push(200); // неизвестный типовой байт
    buf.push(1);
    buf.push(b'k');
    assert!(matches!(decode(&buf).unwrap_err(), RdbError::Format { .. }));
}
