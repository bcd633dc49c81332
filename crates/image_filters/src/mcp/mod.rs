use std::sync::Arc;

use crate::{
    catalog::FilterKind,
    dispatcher::{Dispatcher, InvocationRequest},
    error::FilterError,
};
use rmcp::{
    model::{CallToolResult, Content, ErrorCode, ServerCapabilities, ServerInfo},
    schemars, tool, Error as McpError, ServerHandler,
};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Request for filters without parameters of their own
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FilterImageRequest {
    #[schemars(description = "Path to the input image file")]
    pub image_path: String,
    #[schemars(description = "Optional path to save the filtered image. If not provided, a default path will be used.")]
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(flatten)]
    #[schemars(skip)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct BlurRequest {
    #[schemars(description = "Path to the input image file")]
    pub image_path: String,
    #[schemars(description = "Optional path to save the filtered image. If not provided, a default path will be used.")]
    #[serde(default)]
    pub output_path: Option<String>,
    #[schemars(with = "Option<f64>", description = "Gaussian blur radius (default 2.0)")]
    #[serde(default)]
    pub radius: Option<Value>,
    #[serde(flatten)]
    #[schemars(skip)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SolarizeRequest {
    #[schemars(description = "Path to the input image file")]
    pub image_path: String,
    #[schemars(description = "Optional path to save the filtered image. If not provided, a default path will be used.")]
    #[serde(default)]
    pub output_path: Option<String>,
    #[schemars(
        with = "Option<i64>",
        description = "Channel values at or above this threshold are inverted (default 128)"
    )]
    #[serde(default)]
    pub threshold: Option<Value>,
    #[serde(flatten)]
    #[schemars(skip)]
    pub extra: Map<String, Value>,
}

impl FilterImageRequest {
    fn into_invocation(self, filter: FilterKind) -> InvocationRequest {
        InvocationRequest::new(filter, self.image_path)
            .with_output_path(self.output_path)
            .with_params(self.extra)
    }
}

impl BlurRequest {
    fn into_invocation(self) -> InvocationRequest {
        let request = InvocationRequest::new(FilterKind::Blur, self.image_path)
            .with_output_path(self.output_path)
            .with_params(self.extra);
        match self.radius {
            Some(radius) => request.with_param("radius", radius),
            None => request,
        }
    }
}

impl SolarizeRequest {
    fn into_invocation(self) -> InvocationRequest {
        let request = InvocationRequest::new(FilterKind::Solarize, self.image_path)
            .with_output_path(self.output_path)
            .with_params(self.extra);
        match self.threshold {
            Some(threshold) => request.with_param("threshold", threshold),
            None => request,
        }
    }
}

/// MCP Server exposing one tool per image filter
#[derive(Clone)]
pub struct ImageFilterMcpServer {
    dispatcher: Arc<Dispatcher>,
}

impl ImageFilterMcpServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher: Arc::new(dispatcher) }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    fn run(&self, request: InvocationRequest) -> Result<CallToolResult, McpError> {
        let invocation = self.dispatcher.invoke(request).map_err(to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text(invocation.message())]))
    }
}

fn to_mcp_error(error: FilterError) -> McpError {
    McpError::new(ErrorCode::INTERNAL_ERROR, error.to_string(), None)
}

#[tool(tool_box)]
impl ImageFilterMcpServer {
    #[tool(description = "Convert an image to grayscale.")]
    fn grayscale(&self, #[tool(aggr)] request: FilterImageRequest) -> Result<CallToolResult, McpError> {
        self.run(request.into_invocation(FilterKind::Grayscale))
    }

    #[tool(description = "Apply a sepia tone filter to an image.")]
    fn sepia(&self, #[tool(aggr)] request: FilterImageRequest) -> Result<CallToolResult, McpError> {
        self.run(request.into_invocation(FilterKind::Sepia))
    }

    #[tool(description = "Blur an image using a Gaussian filter.")]
    fn blur(&self, #[tool(aggr)] request: BlurRequest) -> Result<CallToolResult, McpError> {
        self.run(request.into_invocation())
    }

    #[tool(description = "Sharpen an image to enhance details.")]
    fn sharpen(&self, #[tool(aggr)] request: FilterImageRequest) -> Result<CallToolResult, McpError> {
        self.run(request.into_invocation(FilterKind::Sharpen))
    }

    #[tool(description = "Detect edges in an image.")]
    fn edge_detection(&self, #[tool(aggr)] request: FilterImageRequest) -> Result<CallToolResult, McpError> {
        self.run(request.into_invocation(FilterKind::EdgeDetection))
    }

    #[tool(description = "Invert the colors of an image.")]
    fn invert(&self, #[tool(aggr)] request: FilterImageRequest) -> Result<CallToolResult, McpError> {
        self.run(request.into_invocation(FilterKind::Invert))
    }

    #[tool(description = "Apply an emboss filter to an image.")]
    fn emboss(&self, #[tool(aggr)] request: FilterImageRequest) -> Result<CallToolResult, McpError> {
        self.run(request.into_invocation(FilterKind::Emboss))
    }

    #[tool(description = "Apply a contour filter to an image.")]
    fn contour(&self, #[tool(aggr)] request: FilterImageRequest) -> Result<CallToolResult, McpError> {
        self.run(request.into_invocation(FilterKind::Contour))
    }

    #[tool(description = "Smooth an image.")]
    fn smooth(&self, #[tool(aggr)] request: FilterImageRequest) -> Result<CallToolResult, McpError> {
        self.run(request.into_invocation(FilterKind::Smooth))
    }

    #[tool(description = "Apply a solarize effect to an image.")]
    fn solarize(&self, #[tool(aggr)] request: SolarizeRequest) -> Result<CallToolResult, McpError> {
        self.run(request.into_invocation())
    }

    #[tool(description = "List the available filters with their parameters and defaults")]
    fn list_filters(&self) -> String {
        self.dispatcher
            .catalog()
            .to_json()
            .unwrap_or_else(|e| format!("Failed to serialize filter catalog: {}", e))
    }
}

#[tool(tool_box)]
impl ServerHandler for ImageFilterMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(format!(
                "Image Filters Server - apply a named filter to an image file and get back the path of the saved result. Outputs without an explicit path are written to {}.",
                self.dispatcher.environment().writable_dir().display()
            )),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
