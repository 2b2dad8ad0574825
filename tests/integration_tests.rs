use incimap::prelude::*;
use incimap::tiles::source::TileSource;
use std::io::Cursor;
use std::sync::Mutex;

/// Integration tests driving a whole engine the way a host would: resize,
/// feed incidents and input, render frames into raster surfaces.
#[cfg(test)]
mod integration_tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn png(color: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(8, 8, image::Rgba(color));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageOutputFormat::Png).unwrap();
        out.into_inner()
    }

    /// Answers every URL containing `serve` with a solid tile, fails the rest.
    struct Stub {
        serve: Option<&'static str>,
        tile: Vec<u8>,
        requests: Mutex<Vec<String>>,
    }

    impl Stub {
        fn serving(serve: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                serve,
                tile: png([20, 40, 60, 255]),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl TileFetcher for Stub {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.requests.lock().unwrap().push(url.to_string());
            match self.serve {
                Some(part) if url.contains(part) => Ok(self.tile.clone()),
                _ => Err(MapError::HttpStatus {
                    status: 503,
                    url: url.to_string(),
                }),
            }
        }
    }

    struct Harness {
        map: MapEngine,
        base: RasterSurface,
        overlay: RasterSurface,
        markers: RasterSurface,
        t0: Instant,
    }

    impl Harness {
        fn new(config: EngineConfig, fetcher: Arc<dyn TileFetcher>) -> Self {
            init();
            let mut map = MapEngine::with_fetcher(config, fetcher, Arc::new(InlineSpawner));
            map.resize(800.0, 600.0);
            Self {
                map,
                base: RasterSurface::new(800, 600),
                overlay: RasterSurface::new(800, 600),
                markers: RasterSurface::new(800, 600),
                t0: Instant::now(),
            }
        }

        fn offline() -> Self {
            Self::new(EngineConfig::default(), Stub::serving(None))
        }

        fn at(&self, ms: u64) -> Instant {
            self.t0 + Duration::from_millis(ms)
        }

        fn render(&mut self, ms: u64) -> FrameStats {
            let now = self.at(ms);
            match self
                .map
                .render_frame(now, &mut self.base, &mut self.overlay, &mut self.markers)
            {
                FrameOutcome::Rendered(stats) => stats,
                FrameOutcome::Skipped => panic!("frame skipped"),
            }
        }

        fn incident_at(&self, id: &str, x: f64, y: f64) -> IncidentPoint {
            let ll = self.map.viewport().pixel_to_lat_lng(&Point::new(x, y));
            IncidentPoint::new(id, ll.lat, ll.lng)
        }

        fn click(&mut self, x: f64, y: f64, ms: u64) {
            let position = Point::new(x, y);
            self.map.handle_input(&InputEvent::MouseDown { position }, self.at(ms));
            self.map.handle_input(&InputEvent::MouseUp { position }, self.at(ms));
        }
    }

    #[test]
    fn test_fly_to_interpolates_and_lands() {
        let mut h = Harness::offline();
        h.render(0);
        h.map.fly_to(51.5, -0.1, Some(14.0), h.at(0)).unwrap();
        assert!(h.map.is_animating());

        h.render(250);
        let quarter = h.map.map_state();
        assert!((quarter.zoom - 11.1875).abs() < 1e-9);

        h.render(500);
        let mid = h.map.map_state();
        assert!(mid.zoom > 11.0 && mid.zoom < 14.0);
        assert!((mid.zoom - (11.0 + 3.0 * EasingFunction::EaseInOutCubic.apply(0.5))).abs() < 1e-9);
        assert!((mid.lat - 51.5025).abs() < 1e-9);
        assert!((mid.lng - (-0.095)).abs() < 1e-9);

        h.render(1000);
        let end = h.map.map_state();
        assert_eq!(end, MapState::new(51.5, -0.1, 14.0));
        assert!(!h.map.is_animating());
    }

    #[test]
    fn test_fly_to_keeps_zoom_and_replaces_running_flight() {
        let mut h = Harness::offline();
        h.map.fly_to(48.85, 2.35, Some(13.0), h.at(0)).unwrap();
        h.render(500);
        let halfway = h.map.map_state();

        // the new flight starts where the camera is now
        h.map.fly_to(40.0, -3.7, None, h.at(500)).unwrap();
        h.render(500);
        assert_eq!(h.map.map_state(), halfway);
        h.render(1500);
        assert_eq!(h.map.map_state().zoom, halfway.zoom);
        assert!((h.map.map_state().lat - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_all() {
        let mut h = Harness::offline();
        h.map.set_incidents(vec![
            IncidentPoint::new("a", 51.50, -0.20),
            IncidentPoint::new("b", 51.52, 0.00),
            IncidentPoint::new("bad", f64::NAN, 0.0),
        ]);
        h.map.fit_all(h.at(0));
        h.render(1000);

        let state = h.map.map_state();
        assert!((state.lat - 51.51).abs() < 1e-9);
        assert!((state.lng - (-0.10)).abs() < 1e-9);
        assert_eq!(state.zoom, state.zoom.round());
        // both points inside the padded canvas, and one level deeper would not fit
        let vp = h.map.viewport();
        for p in &h.map.incidents()[..2] {
            let px = vp.lat_lng_to_pixel(&p.lat_lng());
            assert!(px.x >= 50.0 && px.x <= 750.0 && px.y >= 50.0 && px.y <= 550.0);
        }
        let deeper = Viewport::new(MapState { zoom: state.zoom + 1.0, ..state }, 800.0, 600.0);
        let a = deeper.lat_lng_to_pixel(&LatLng::new(51.50, -0.20));
        let b = deeper.lat_lng_to_pixel(&LatLng::new(51.52, 0.00));
        assert!((a.x - b.x).abs() > 700.0 || (a.y - b.y).abs() > 500.0);
    }

    #[test]
    fn test_fit_all_single_point_and_empty() {
        let mut h = Harness::offline();
        h.map.set_incidents(vec![IncidentPoint::new("only", 40.7, -74.0)]);
        h.map.fit_all(h.at(0));
        h.render(1000);
        assert_eq!(h.map.map_state(), MapState::new(40.7, -74.0, 17.0));

        h.map.set_incidents(Vec::new());
        h.map.fit_all(h.at(1000));
        h.render(2000);
        assert_eq!(h.map.map_state(), MapState::new(51.505, -0.09, 11.0));
    }

    #[test]
    fn test_clicks_report_pins_clusters_and_map() {
        let mut h = Harness::offline();
        let (listener, events) = ChannelListener::new();
        h.map.add_listener(Box::new(listener));

        // street level: every incident is its own pin
        h.map.set_map_state(MapState::new(51.505, -0.09, 14.0));
        let a = h.incident_at("a", 200.0, 200.0);
        let b = h.incident_at("b", 600.0, 400.0);
        h.map.set_incidents(vec![a, b]);
        h.render(0);
        let _: Vec<MapEvent> = events.try_iter().collect();

        h.click(205.0, 203.0, 10);
        assert_eq!(
            events.try_iter().collect::<Vec<_>>(),
            vec![MapEvent::IncidentClick { id: "a".into() }]
        );

        h.click(400.0, 100.0, 20);
        let expected = h.map.viewport().pixel_to_lat_lng(&Point::new(400.0, 100.0));
        match events.try_iter().next() {
            Some(MapEvent::MapClick { lat_lng }) => {
                assert!((lat_lng.lat - expected.lat).abs() < 1e-9);
                assert!((lat_lng.lng - expected.lng).abs() < 1e-9);
            }
            other => panic!("expected map click, got {:?}", other),
        }

        // zoomed out: two incidents 5px apart merge
        h.map.set_map_state(MapState::new(51.505, -0.09, 10.0));
        let c1 = h.incident_at("c1", 300.0, 300.0);
        let c2 = h.incident_at("c2", 305.0, 300.0);
        h.map.set_incidents(vec![c1, c2]);
        h.render(30);
        assert_eq!(h.map.markers().len(), 1);
        let _: Vec<MapEvent> = events.try_iter().collect();

        h.click(302.0, 301.0, 40);
        assert_eq!(
            events.try_iter().next(),
            Some(MapEvent::ClusterClick {
                ids: vec!["c1".into(), "c2".into()]
            })
        );
        assert!(h.map.is_animating());
        h.render(1040);
        assert_eq!(h.map.map_state().zoom, 12.0);
    }

    #[test]
    fn test_drag_moves_content_with_pointer() {
        let mut h = Harness::offline();
        let before = h.map.viewport();
        let anchor = before.pixel_to_lat_lng(&Point::new(400.0, 300.0));

        h.map.handle_input(&InputEvent::MouseDown { position: Point::new(400.0, 300.0) }, h.at(0));
        h.map.handle_input(&InputEvent::MouseMove { position: Point::new(450.0, 320.0) }, h.at(16));
        h.map.handle_input(&InputEvent::MouseMove { position: Point::new(500.0, 340.0) }, h.at(32));
        h.map.handle_input(&InputEvent::MouseUp { position: Point::new(500.0, 340.0) }, h.at(48));

        let moved = h.map.viewport().lat_lng_to_pixel(&anchor);
        assert!((moved.x - 500.0).abs() < 1e-6);
        assert!((moved.y - 340.0).abs() < 1e-6);
    }

    #[test]
    fn test_state_change_notified_after_frame_only() {
        let mut h = Harness::offline();
        let (listener, events) = ChannelListener::new();
        h.map.add_listener(Box::new(listener));
        h.render(0);
        assert_eq!(events.try_iter().count(), 1);

        for (i, key) in [Key::ArrowLeft, Key::ArrowLeft, Key::Plus].into_iter().enumerate() {
            h.map.handle_input(&InputEvent::Key { key, in_text_input: false }, h.at(i as u64));
        }
        assert_eq!(events.try_iter().count(), 0);
        h.render(20);
        let state = h.map.map_state();
        assert_eq!(
            events.try_iter().collect::<Vec<_>>(),
            vec![MapEvent::MapStateChange { state }]
        );
        assert_eq!(state.zoom, 12.0);
    }

    #[test]
    fn test_scheduler_cadence_through_engine() {
        let mut h = Harness::offline();
        h.render(0);
        // failed loads come back on the next frame
        h.render(20);
        h.render(40);
        assert_eq!(h.map.next_frame_at(), None);

        // idle: a request waits out the idle interval
        assert_eq!(
            h.map.schedule_render(h.at(50)),
            ScheduleDecision::Deferred(Duration::from_millis(490))
        );
        assert_eq!(h.map.schedule_render(h.at(51)), ScheduleDecision::AlreadyPending);

        // input pulls the pending frame forward to the active cadence
        h.map.handle_input(&InputEvent::MouseMove { position: Point::new(1.0, 1.0) }, h.at(60));
        assert_eq!(h.map.next_frame_at(), Some(h.at(60)));
    }

    #[test]
    fn test_fallback_tiles_are_drawn() {
        let stub = Stub::serving(Some("openstreetmap"));
        let mut h = Harness::new(EngineConfig::default(), stub.clone());
        let first = h.render(0);
        assert!(first.tiles_requested > 0);

        let second = h.render(20);
        assert_eq!(second.tiles_drawn, first.tiles_requested);
        assert_eq!(h.base.pixel(400, 300), Color::rgb(20, 40, 60));

        let requests = stub.requests.lock().unwrap();
        assert_eq!(requests.len(), first.tiles_requested * 2);
        assert!(requests.iter().any(|u| u.contains("basemaps.cartocdn.com/light_all")));
    }

    #[test]
    fn test_theme_and_satellite_pick_sources() {
        let stub = Stub::serving(None);
        let mut h = Harness::new(EngineConfig::default(), stub.clone());
        h.map.set_display_mode(DisplayMode {
            theme: Theme::Dark,
            ..DisplayMode::default()
        });
        h.render(0);
        h.map.set_display_mode(DisplayMode {
            satellite: true,
            ..DisplayMode::default()
        });
        h.render(20);

        let requests = stub.requests.lock().unwrap();
        assert!(requests.iter().any(|u| u.contains("dark_all")));
        assert!(requests.iter().any(|u| u.contains("World_Imagery")));
        assert!(!requests.iter().any(|u| u.contains("light_all")));
    }

    #[test]
    fn test_cache_stays_bounded_while_panning() {
        let mut config = EngineConfig::default();
        config.tiles.cache_size = 50;
        let sources = TileSources::from_config(&config.tiles);
        let resolver = TileResolver::new(config.tiles.margin_tiles, config.zoom);
        let mut h = Harness::new(config, Stub::serving(Some("cartocdn")));

        for step in 0..30 {
            h.map.set_map_state(MapState::new(51.5, -0.09 + step as f64 * 0.5, 11.0));
            h.render(step * 40);
            h.render(step * 40 + 20);
            assert!(h.map.cache().len() <= 50);

            for slot in resolver.resolve(&h.map.viewport()) {
                assert!(h.map.cache().has(&sources.light.url(slot.coord)));
            }
        }
    }

    #[test]
    fn test_new_outside_runtime_is_an_error() {
        init();
        match MapEngine::new(EngineConfig::default()) {
            Err(MapError::NoRuntime(_)) => {}
            Err(e) => panic!("unexpected error {}", e),
            Ok(_) => panic!("engine built without a runtime"),
        }
    }

    #[cfg(feature = "tokio-runtime")]
    #[tokio::test]
    async fn test_new_inside_runtime() {
        init();
        let map = MapEngine::new(EngineConfig::default()).expect("inside a runtime");
        assert!(map.next_frame_at().is_some());
    }

    #[test]
    fn test_pin_drawn_over_heatmap() {
        let mut h = Harness::offline();
        h.map.set_map_state(MapState::new(51.505, -0.09, 15.0));
        let pin = h.incident_at("a", 400.0, 300.0).with_status(IncidentStatus::Reported);
        h.map.set_incidents(vec![pin]);
        h.map.set_display_mode(DisplayMode {
            heatmap: true,
            ..DisplayMode::default()
        });

        let stats = h.render(0);
        assert!(stats.heatmap_painted);
        assert!(h.overlay.pixel(400, 300).a > 0);
        assert_eq!(h.markers.pixel(400, 300), Color::rgb(229, 57, 53));
    }

    #[test]
    fn test_zero_size_canvas_is_skipped() {
        let mut h = Harness::offline();
        h.map.resize(0.0, 600.0);
        let now = h.at(0);
        let outcome = h.map.render_frame(now, &mut h.base, &mut h.overlay, &mut h.markers);
        assert_eq!(outcome, FrameOutcome::Skipped);
        assert!(h.map.next_frame_at().is_some());
    }

    #[test]
    fn test_mobile_profile_idles_longer() {
        let config = EngineConfig::for_device(DeviceClass::Mobile);
        let mut h = Harness::new(config, Stub::serving(None));
        h.render(0);
        h.render(20);
        h.render(40);
        assert_eq!(
            h.map.schedule_render(h.at(50)),
            ScheduleDecision::Deferred(Duration::from_millis(990))
        );
    }

    #[cfg(feature = "tokio-runtime")]
    #[tokio::test]
    async fn test_tiles_load_on_tokio() {
        init();
        let stub = Stub::serving(Some("cartocdn"));
        let spawner = TokioSpawner::current().expect("inside a runtime");
        let mut map = MapEngine::with_fetcher(EngineConfig::default(), stub, Arc::new(spawner));
        map.resize(256.0, 256.0);
        let mut base = RasterSurface::new(256, 256);
        let mut overlay = RasterSurface::new(256, 256);
        let mut markers = RasterSurface::new(256, 256);

        let FrameOutcome::Rendered(first) =
            map.render_frame(Instant::now(), &mut base, &mut overlay, &mut markers)
        else {
            panic!("frame skipped");
        };
        assert!(first.tiles_requested > 0);
        assert!(map.next_frame_at().is_some());

        tokio::time::sleep(Duration::from_millis(50)).await;
        let FrameOutcome::Rendered(second) =
            map.render_frame(Instant::now(), &mut base, &mut overlay, &mut markers)
        else {
            panic!("frame skipped");
        };
        assert_eq!(second.tiles_drawn, first.tiles_requested);
    }
}
