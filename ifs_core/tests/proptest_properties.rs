use ifs_core::container::{frame, unframe};
use ifs_core::{
    decode_image, delta, encode_image, Channels, Compression, DecodeOptions, EncodeOptions, Metadata,
    PixelBuffer,
};
use proptest::prelude::*;

fn channels() -> impl Strategy<Value = Channels> {
    prop_oneof![Just(Channels::Rgb), Just(Channels::Rgba)]
}

fn compression() -> impl Strategy<Value = Compression> {
    prop_oneof![
        Just(Compression::Store),
        Just(Compression::Fast),
        Just(Compression::Balanced),
        Just(Compression::HighRatio),
    ]
}

fn image() -> impl Strategy<Value = PixelBuffer> {
    (1u32..24, 1u32..24, channels()).prop_flat_map(|(w, h, ch)| {
        proptest::collection::vec(any::<u8>(), (w * h) as usize * ch.count())
            .prop_map(move |samples| PixelBuffer::new(w, h, ch, samples).unwrap())
    })
}

proptest! {
    #[test]
    fn prop_delta_is_a_bijection(
        samples in proptest::collection::vec(any::<u8>(), 0..2048),
        channels in 1usize..=4
    ) {
        let deltas = delta::encode(&samples, channels).unwrap();
        prop_assert_eq!(deltas.len(), samples.len());
        prop_assert_eq!(delta::decode(&deltas, channels).unwrap(), samples);
    }

    #[test]
    fn prop_plain_roundtrip(image in image(), compression in compression(), flag in any::<bool>()) {
        let options = EncodeOptions::default()
            .with_compression(compression)
            .with_delete_metadata(flag);
        let blob = encode_image(&image, &options).unwrap();
        let back = decode_image(&blob, &DecodeOptions::default()).unwrap();
        prop_assert_eq!(back, image);
    }

    #[test]
    fn prop_frame_unframe_roundtrip(
        width in 1u32..=u32::MAX,
        height in 1u32..=u32::MAX,
        channels in channels(),
        compression in compression(),
        delete_metadata in any::<bool>(),
        payload in proptest::collection::vec(any::<u8>(), 0..512)
    ) {
        let meta = Metadata {
            width,
            height,
            channels,
            delete_metadata,
            compression,
            encrypted: false,
            kdf_iterations: 0,
        };
        let blob = frame(&meta, &payload);
        let (back, body) = unframe(&blob).unwrap();
        prop_assert_eq!(back, meta);
        prop_assert_eq!(body, &payload[..]);
    }
}

proptest! {
    // Each case runs PBKDF2 twice; keep the count small.
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn prop_password_roundtrip(image in image(), password in "[a-zA-Z0-9 ]{1,24}") {
        let options = EncodeOptions::default().with_password(password.clone());
        let blob = encode_image(&image, &options).unwrap();
        let back = decode_image(&blob, &DecodeOptions::with_password(password)).unwrap();
        prop_assert_eq!(back, image);
    }
}
