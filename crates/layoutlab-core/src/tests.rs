#[cfg(test)]
mod tests {
    use crate::signal::*;
    use crate::*;

    #[test]
    fn test_signal_basic() {
        let sig = signal(42);
        assert_eq!(sig.get(), 42);

        sig.set(100);
        assert_eq!(sig.get(), 100);

        sig.update(|v| *v += 1);
        assert_eq!(sig.get(), 101);
    }

    #[test]
    fn test_signal_clones_share_value() {
        let sig = signal(String::from("a"));
        let other = sig.clone();
        other.update(|v| v.push('b'));
        assert_eq!(sig.with(|v| v.len()), 2);
        assert_eq!(sig.get(), "ab");
    }

    #[test]
    fn test_key_based_remember() {
        let guard = ComposeGuard::begin(Composer::default());
        let val1 = remember_with_key("test", || 42);
        let val2 = remember_with_key("test", || 100);
        drop(guard.finish());

        assert_eq!(*val1, 42);
        assert_eq!(*val2, 42);
    }

    #[test]
    fn test_keyed_slot_dropped_when_not_composed() {
        let pass = |composer: Composer, read: bool| -> (Composer, String) {
            let guard = ComposeGuard::begin(composer);
            let value = if read {
                let s = remember_state_with_key("query", String::new);
                if s.borrow().is_empty() {
                    s.borrow_mut().push_str("abc");
                    String::new()
                } else {
                    s.borrow().clone()
                }
            } else {
                String::new()
            };
            (guard.finish(), value)
        };

        let (composer, first) = pass(Composer::default(), true);
        assert_eq!(first, "");
        let (composer, second) = pass(composer, true);
        assert_eq!(second, "abc");
        // A pass that never reads the key releases it.
        let (composer, _) = pass(composer, false);
        assert!(composer.keyed_slots.is_empty());
    }

    #[test]
    fn test_schedulers_do_not_share_slots() {
        fn paint(_: &View, _: (u32, u32)) -> (Scene, Vec<HitRegion>, Vec<SemNode>) {
            (Scene::default(), Vec::new(), Vec::new())
        }
        // Tags the root with the value seen before writing "yoga".
        fn query(_s: &mut Scheduler) -> View {
            let q = remember_state_with_key("query", String::new);
            let seen = std::mem::replace(&mut *q.borrow_mut(), "yoga".to_string());
            View::new(0, ViewKind::Box).modifier(Modifier::new().test_tag(seen))
        }

        let mut first = Scheduler::new();
        first.compose(query, paint);
        let again = first.compose(query, paint);
        assert_eq!(again.root.modifier.test_tag.as_deref(), Some("yoga"));

        let mut fresh = Scheduler::new();
        let frame = fresh.compose(query, paint);
        assert_eq!(frame.root.modifier.test_tag.as_deref(), Some(""));
    }

    #[test]
    fn test_color_from_hex() {
        assert_eq!(Color::from_hex("#FF5733"), Color(255, 87, 51, 255));
        assert_eq!(Color::from_hex("#FF5733AA"), Color(255, 87, 51, 170));
        assert_eq!(Color::from_hex("nonsense"), Color::BLACK);
        assert_eq!(Color(136, 136, 136, 255).to_hex(), "#888888");
    }

    #[test]
    fn test_rect_contains_and_intersect() {
        let rect = Rect::new(10.0, 10.0, 100.0, 50.0);

        assert!(rect.contains(Vec2 { x: 50.0, y: 30.0 }));
        assert!(!rect.contains(Vec2 { x: 5.0, y: 30.0 }));
        assert!(!rect.contains(Vec2 { x: 50.0, y: 70.0 }));

        let other = Rect::new(90.0, 40.0, 100.0, 100.0);
        assert_eq!(rect.intersect(&other), Rect::new(90.0, 40.0, 20.0, 20.0));
        assert!(!rect.intersects(&Rect::new(200.0, 0.0, 5.0, 5.0)));
    }

    #[test]
    fn test_padding_accumulates() {
        let m = Modifier::new().padding_horizontal(8.0).padding(12.0);
        assert_eq!(
            m.padding,
            Some(PaddingValues {
                left: 20.0,
                right: 20.0,
                top: 12.0,
                bottom: 12.0
            })
        );

        let outer = Modifier::new().padding_values(PaddingValues {
            bottom: 80.0,
            ..PaddingValues::ZERO
        });
        let merged = Modifier::new().fill_max_size().padding(4.0).then(outer);
        assert!(merged.fill_max);
        assert_eq!(merged.padding.map(|p| p.bottom), Some(84.0));
    }

    #[test]
    fn test_locals_nest_and_restore() {
        let insets = WindowInsets {
            top: 24.0,
            bottom: 48.0,
            ..Default::default()
        };
        with_window_insets(insets, || {
            assert_eq!(window_insets().bottom, 48.0);
            with_density(Density { scale: 2.0 }, || {
                assert_eq!(dp_to_px(10.0), 20.0);
                assert_eq!(window_insets().top, 24.0);
            });
            assert_eq!(density().scale, 1.0);
        });
        assert_eq!(window_insets(), WindowInsets::default());
    }

    #[test]
    fn test_image_handles_and_registry() {
        assert_eq!(ImageHandle::named("lotfi"), ImageHandle::named("lotfi"));
        assert_ne!(ImageHandle::named("lotfi"), ImageHandle::named("lotfj"));

        let bad = ImageSource::new("broken", 2, 2, vec![0; 3]);
        assert!(matches!(bad, Err(UiError::ImageDecode { .. })));

        let h = ImageHandle::named("core-test-pixel");
        assert!(!is_registered(h));
        register_image(h, ImageSource::new("core-test-pixel", 1, 1, vec![255; 4]).unwrap());
        let img = image(h).unwrap();
        assert_eq!((img.width, img.height), (1, 1));
        assert!(img.generation > 0);
        assert!(unregister_image(h));
    }
}
