use std::path::PathBuf;

use image::RgbImage;
use serde_json::{Map, Value};
use tracing::{info, info_span, warn};

use crate::{
    catalog::{FilterCatalog, FilterKind, FilterParams},
    environment::FilterEnvironment,
    error::{FilterError, Result},
    paths::{OutputPlacement, PathResolver, ResolvedInput},
    test_image,
};

/// One tool call: which filter, which image, where to, with what
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    pub filter: FilterKind,
    pub image_path: String,
    pub output_path: Option<String>,
    pub extra_params: Map<String, Value>,
}

impl InvocationRequest {
    pub fn new(filter: FilterKind, image_path: impl Into<String>) -> Self {
        Self {
            filter,
            image_path: image_path.into(),
            output_path: None,
            extra_params: Map::new(),
        }
    }

    pub fn with_output_path(mut self, output_path: Option<String>) -> Self {
        self.output_path = output_path;
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra_params.insert(name.into(), value.into());
        self
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.extra_params.extend(params);
        self
    }
}

/// Outcome of a successful invocation
#[derive(Debug, Clone)]
pub struct Invocation {
    pub filter: FilterKind,
    pub input: ResolvedInput,
    /// The input could not be decoded and a generated gradient was filtered instead
    pub synthetic_input: bool,
    pub params: FilterParams,
    pub output_path: PathBuf,
}

impl Invocation {
    pub fn message(&self) -> String {
        format!(
            "Filter '{}' applied successfully. Image saved to {}",
            self.filter,
            self.output_path.display()
        )
    }
}

/// Resolve -> load -> select params -> apply -> place -> save
pub struct Dispatcher {
    catalog: FilterCatalog,
    resolver: PathResolver,
    placement: OutputPlacement,
    environment: FilterEnvironment,
}

impl Dispatcher {
    pub fn new(environment: FilterEnvironment) -> Self {
        Self {
            catalog: FilterCatalog::new(),
            resolver: PathResolver::new(environment.clone()),
            placement: OutputPlacement::new(environment.clone()),
            environment,
        }
    }

    pub fn catalog(&self) -> &FilterCatalog {
        &self.catalog
    }

    pub fn environment(&self) -> &FilterEnvironment {
        &self.environment
    }

    /// Look the filter up by name, then invoke it
    pub fn invoke_named(
        &self,
        filter: &str,
        image_path: &str,
        output_path: Option<String>,
        params: Map<String, Value>,
    ) -> Result<Invocation> {
        let kind = self.catalog.lookup(filter)?;
        self.invoke(
            InvocationRequest::new(kind, image_path)
                .with_output_path(output_path)
                .with_params(params),
        )
    }

    pub fn invoke(&self, request: InvocationRequest) -> Result<Invocation> {
        let kind = request.filter;
        let _span = info_span!("filter", name = %kind).entered();
        info!("Applying {} filter to {}", kind, request.image_path);

        let input = self.resolver.resolve(&request.image_path)?;
        let (image, synthetic_input) = self.load(&input)?;

        let params = kind.select_params(&request.extra_params);
        info!("Parameters: {:?}", params);

        let filter = kind.build(&params);
        let filtered = filter.apply(&image).map_err(|e| {
            warn!("Filter {} failed: {}", kind, e);
            FilterError::Apply {
                filter: kind.to_string(),
                source: Box::new(e),
            }
        })?;

        let target = self
            .placement
            .place(request.output_path.as_deref(), &input.path, kind);
        let output_path = self.placement.save(&filtered, &target)?;
        if output_path != target {
            warn!("Requested output {} was rerouted to {}", target.display(), output_path.display());
        }

        let invocation = Invocation {
            filter: kind,
            input,
            synthetic_input,
            params,
            output_path,
        };
        info!("{}", invocation.message());
        Ok(invocation)
    }

    /// Decode the input as RGB, or synthesize a gradient in lenient mode
    fn load(&self, input: &ResolvedInput) -> Result<(RgbImage, bool)> {
        match image::open(&input.path) {
            Ok(image) => {
                info!(
                    "Loaded {} ({}x{}, {:?})",
                    input.path.display(),
                    image.width(),
                    image.height(),
                    image.color()
                );
                Ok((image.into_rgb8(), false))
            }
            Err(e) if self.environment.strictness().is_strict() => Err(e.into()),
            Err(e) => {
                warn!(
                    "Could not decode {} ({}), using a generated gradient",
                    input.path.display(),
                    e
                );
                Ok((test_image::default_gradient(), true))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ServerConfig, Strictness};
    use std::path::Path;

    fn dispatcher(dir: &Path, strictness: Strictness) -> Dispatcher {
        let config = ServerConfig {
            output_dir: Some(dir.join("writable")),
            strictness,
            ..Default::default()
        };
        Dispatcher::new(FilterEnvironment::initialize_with_home(&config, Some(dir.join("home"))))
    }

    fn write_gradient(path: &Path) {
        test_image::gradient(300, 200).save(path).unwrap();
    }

    #[test]
    fn test_blur_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher(dir.path(), Strictness::Lenient);
        let input = dir.path().join("gradient.png");
        write_gradient(&input);
        let output = dir.path().join("out/blurred.png");

        let invocation = dispatcher
            .invoke(
                InvocationRequest::new(FilterKind::Blur, input.to_str().unwrap())
                    .with_output_path(Some(output.to_string_lossy().into_owned()))
                    .with_param("radius", 5.0),
            )
            .unwrap();

        assert_eq!(invocation.output_path, output);
        assert_eq!(
            invocation.message(),
            format!("Filter 'blur' applied successfully. Image saved to {}", output.display())
        );
        assert!(!invocation.input.is_fallback());
        assert!(!invocation.synthetic_input);
        assert_eq!(invocation.params.float("radius"), Some(5.0));
        assert_ne!(std::fs::read(&input).unwrap(), std::fs::read(&output).unwrap());
    }

    #[test]
    fn test_bogus_input_succeeds_for_every_filter() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher(dir.path(), Strictness::Lenient);
        let writable = dispatcher.environment().writable_dir().to_path_buf();

        for name in FilterKind::names() {
            let invocation = dispatcher
                .invoke_named(name, "/no/such/image.png", None, Map::new())
                .unwrap();
            let message = invocation.message();
            assert!(invocation.output_path.starts_with(&writable), "{message}");
            assert!(message.ends_with(&format!("_{name}.jpg")), "{message}");
            assert!(invocation.output_path.exists());
        }
    }

    #[test]
    fn test_undecodable_input_uses_synthetic_gradient() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher(dir.path(), Strictness::Lenient);
        let input = dir.path().join("notes.png");
        std::fs::write(&input, b"definitely not a png").unwrap();

        let invocation = dispatcher
            .invoke(InvocationRequest::new(FilterKind::Invert, input.to_str().unwrap()))
            .unwrap();
        assert!(invocation.synthetic_input);
        assert_eq!(
            invocation.output_path,
            dir.path().join("writable/notes_invert.png")
        );
        let saved = image::open(&invocation.output_path).unwrap();
        assert_eq!((saved.width(), saved.height()), (300, 200));
    }

    #[test]
    fn test_filter_failure_is_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher(dir.path(), Strictness::Lenient);

        let err = dispatcher
            .invoke(InvocationRequest::new(FilterKind::Blur, "missing.png").with_param("radius", -3.0))
            .unwrap_err();
        match err {
            FilterError::Apply { filter, source } => {
                assert_eq!(filter, "blur");
                assert!(matches!(*source, FilterError::InvalidParameter { name: "radius", .. }));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_unknown_filter_and_params() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher(dir.path(), Strictness::Lenient);
        assert!(matches!(
            dispatcher.invoke_named("posterize", "x.png", None, Map::new()),
            Err(FilterError::UnknownFilter(_))
        ));

        let mut params = Map::new();
        params.insert("intensity".into(), Value::from(9));
        let invocation = dispatcher.invoke_named("sepia", "x.png", None, params).unwrap();
        assert!(invocation.params.is_empty());
    }

    #[test]
    fn test_strict_mode_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher(dir.path(), Strictness::Strict);
        assert!(matches!(
            dispatcher.invoke(InvocationRequest::new(FilterKind::Grayscale, "/no/such.png")),
            Err(FilterError::InputResolution { .. })
        ));

        let input = dir.path().join("broken.png");
        std::fs::write(&input, b"garbage").unwrap();
        assert!(matches!(
            dispatcher.invoke(InvocationRequest::new(FilterKind::Grayscale, input.to_str().unwrap())),
            Err(FilterError::Image(_))
        ));
    }
}
