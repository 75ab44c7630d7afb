// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entities for a web browser logged into a site and the elements of its
//! pages.
//!
//! Browser automation itself is delegated to a [`Driver`] (a WebDriver
//! client, a headless engine binding, a test double) and the
//! [`DriverElement`] handles it hands out.  [`WebBrowser`] opens the driver
//! lazily and traces what it asks of it; [`Element`] does the same for one
//! element.

use crate::context::Context;
use crate::describe::truncate;
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::secret::render_masked;
use crate::sys::Duration;
use automation_entities_proc::describe;
use std::cell::{RefCell, RefMut};
use std::fmt::{Debug, Display};
use thiserror::Error;

/// How long a page may take to load.
pub const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

pub const WINDOW_WIDTH: u32 = 1600;
pub const WINDOW_HEIGHT: u32 = 900;

/// How long [`WebBrowser::page_info_result`] waits for a page header.
pub const HEADER_TIMEOUT: Duration = Duration::from_secs(2);

/// Attributes shown in an [`Element`]'s name, in this order.
const NAMED_ATTRIBUTES: [&str; 3] = ["name", "placeholder", "value"];

/// Logged when `get_elements` matches nothing.
const NOTHING_FOUND: &str = "--nothing--";

/// Failures reported by a [`Driver`] or a [`DriverElement`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// Nothing matched the selector (yet).
    #[error("no such element: {0}")]
    NoSuchElement(String),

    /// The element was detached from the page after it was found.
    #[error("stale element reference: {0}")]
    StaleElement(String),

    /// A page didn't finish loading within [`PAGE_LOAD_TIMEOUT`].
    #[error("page load timed out: {0}")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

/// Element selector strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum By {
    XPath,
    CssSelector,
    Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// One element of a page, as the driver sees it.
pub trait DriverElement: Sized {
    fn tag_name(&self) -> Result<String, DriverError>;

    /// Rendered text, empty if there is none.
    fn text(&self) -> Result<String, DriverError>;

    fn attribute(&self, name: &str) -> Result<Option<String>, DriverError>;

    fn send_keys(&self, keys: &str) -> Result<(), DriverError>;

    fn click(&self) -> Result<(), DriverError>;

    fn clear(&self) -> Result<(), DriverError>;

    fn submit(&self) -> Result<(), DriverError>;

    /// First descendant matching `selector`, or
    /// [`DriverError::NoSuchElement`].
    fn find_element(&self, by: By, selector: &str) -> Result<Self, DriverError>;

    fn find_elements(&self, by: By, selector: &str) -> Result<Vec<Self>, DriverError>;
}

/// The browser binding a [`WebBrowser`] drives.
pub trait Driver {
    type Element: DriverElement;

    fn set_page_load_timeout(&mut self, timeout: Duration) -> Result<(), DriverError>;

    fn set_window_size(&mut self, width: u32, height: u32) -> Result<(), DriverError>;

    /// Navigates to `url`.  Fails with [`DriverError::Timeout`] if the page
    /// takes longer than the page load timeout.
    fn get(&mut self, url: &str) -> Result<(), DriverError>;

    fn current_url(&mut self) -> Result<String, DriverError>;

    fn title(&mut self) -> Result<String, DriverError>;

    /// Name of the browser, e.g. `"chrome"`.
    fn name(&self) -> String;

    fn window_rect(&mut self) -> Result<WindowRect, DriverError>;

    /// First element of the page matching `selector`, or
    /// [`DriverError::NoSuchElement`].
    fn find_element(&mut self, by: By, selector: &str) -> Result<Self::Element, DriverError>;

    fn find_elements(&mut self, by: By, selector: &str)
    -> Result<Vec<Self::Element>, DriverError>;

    /// Clicks wherever the pointer currently is.
    fn click(&mut self) -> Result<(), DriverError>;

    fn refresh(&mut self) -> Result<(), DriverError>;

    fn close(&mut self) -> Result<(), DriverError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BrowserKind {
    #[default]
    Chrome,
}

/// How a driver should launch its browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserOptions {
    pub browser: BrowserKind,
    pub user_data_dir: Option<String>,
    pub headless: bool,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        BrowserOptions {
            browser: BrowserKind::Chrome,
            user_data_dir: None,
            headless: true,
        }
    }
}

impl BrowserOptions {
    /// Command line arguments for the browser process.
    pub fn arguments(&self) -> Vec<String> {
        let mut arguments = vec![
            "--disable-dev-shm-usage".to_string(),
            "--no-sandbox".to_string(),
        ];
        if let Some(user_data_dir) = &self.user_data_dir {
            arguments.push(format!("--user-data-dir={user_data_dir}"));
        }
        if self.headless {
            arguments.push("--headless".to_string());
        }
        arguments
    }
}

/// Snapshot of the browser's state for bug reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebBrowserDebugInfo {
    pub url: String,
    pub title: String,
    pub name: String,
    pub window: WindowRect,
}

/// Errors `get_element_retry` keeps polling through.
fn is_missing_element(error: &Error) -> bool {
    matches!(
        error,
        Error::Driver(DriverError::NoSuchElement(_) | DriverError::StaleElement(_))
    )
}

/// Logs `"get_element <selector>"` for `entity` and wraps what `find`
/// returns, logging its name in a result block under the request.
fn traced_get_element<T, E>(
    entity: &T,
    selector: &str,
    find: impl FnOnce() -> Result<E>,
) -> Result<Element<E>>
where
    T: Entity + ?Sized,
    E: DriverElement,
{
    let _interaction = entity.interaction().entered()?;
    entity
        .request(Some(format!("get_element {selector}").as_str()))
        .run(|_| -> Result<Element<E>> {
            let element = Element::new(entity.context().clone(), find()?)?;
            entity
                .result(None)
                .run(|result| result.log(element.name()))?;
            Ok(element)
        })?
}

fn traced_get_elements<T, E>(
    entity: &T,
    selector: &str,
    find: impl FnOnce() -> Result<Vec<E>>,
) -> Result<Vec<Element<E>>>
where
    T: Entity + ?Sized,
    E: DriverElement,
{
    let _interaction = entity.interaction().entered()?;
    entity
        .request(Some(format!("get_elements {selector}").as_str()))
        .run(|_| -> Result<Vec<Element<E>>> {
            let elements = find()?
                .into_iter()
                .map(|handle| Element::new(entity.context().clone(), handle))
                .collect::<Result<Vec<_>>>()?;
            entity.result(None).run(|result| {
                if elements.is_empty() {
                    result.log(NOTHING_FOUND);
                }
                for element in &elements {
                    result.log(element.name());
                }
            })?;
            Ok(elements)
        })?
}

/// Polls `get` on the context's clock while the element is missing or
/// stale.  `None` keeps the default timeout.
fn retry_get_element<E>(
    context: &Context,
    timeout: Option<Duration>,
    get: impl FnMut() -> Result<Element<E>>,
) -> Result<Element<E>> {
    let mut retry = context.try_timeout();
    if let Some(timeout) = timeout {
        retry = retry.timeout(timeout);
    }
    Ok(retry.run_ignoring(get, is_missing_element)?)
}

type Launcher<D> = Box<dyn Fn(&BrowserOptions) -> Result<D, DriverError>>;

/// Entity representing a browser on a site, named `"WebBrowser <baseurl>"`.
///
/// The driver is launched on first use, inside an interaction of its own,
/// and pointed at the base URL.
pub struct WebBrowser<D> {
    context: Context,
    name: String,
    baseurl: String,
    options: BrowserOptions,
    launcher: Launcher<D>,
    driver: RefCell<Option<D>>,
}

impl<D: Debug> Debug for WebBrowser<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebBrowser")
            .field("baseurl", &self.baseurl)
            .field("options", &self.options)
            .field("driver", &self.driver)
            .finish_non_exhaustive()
    }
}

impl<D: Driver> WebBrowser<D> {
    pub fn new(
        context: Context,
        baseurl: impl Into<String>,
        options: BrowserOptions,
        launcher: impl Fn(&BrowserOptions) -> Result<D, DriverError> + 'static,
    ) -> Self {
        let baseurl = baseurl.into();
        WebBrowser {
            context,
            name: format!("WebBrowser {baseurl}"),
            baseurl,
            options,
            launcher: Box::new(launcher),
            driver: RefCell::new(None),
        }
    }

    pub fn baseurl(&self) -> &str {
        &self.baseurl
    }

    pub fn options(&self) -> &BrowserOptions {
        &self.options
    }

    pub fn is_open(&self) -> bool {
        self.driver.borrow().is_some()
    }

    /// The driver, launching it first if needed.
    pub fn driver(&self) -> Result<RefMut<'_, D>> {
        if !self.is_open() {
            let driver = self.open()?;
            *self.driver.borrow_mut() = Some(driver);
        }
        RefMut::filter_map(self.driver.borrow_mut(), Option::as_mut)
            .map_err(|_| Error::Driver(DriverError::Other("driver unavailable".to_string())))
    }

    fn open(&self) -> Result<D> {
        let _interaction = self.interaction().entered()?;
        self.request(Some(format!("open {}", self.baseurl).as_str()));
        let mut driver = (self.launcher)(&self.options)?;
        driver.set_page_load_timeout(PAGE_LOAD_TIMEOUT)?;
        driver.set_window_size(WINDOW_WIDTH, WINDOW_HEIGHT)?;
        driver.get(&self.baseurl)?;
        Ok(driver)
    }

    /// Closes the browser and flushes the context's sink.  The next use
    /// launches a new browser.
    pub fn close(&self) -> Result<()> {
        {
            let _interaction = self.interaction().entered()?;
            self.request(Some("close"));
            self.driver()?.close()?;
            *self.driver.borrow_mut() = None;
        }
        self.context.flush();
        Ok(())
    }

    /// Navigates to `url`, retrying page load timeouts, and logs what the
    /// page shows.
    pub fn get(&self, url: &str) -> Result<()> {
        let _interaction = self.interaction().entered()?;
        self.request(Some(format!("GET {url}").as_str()))
            .run(|_| -> Result<()> {
                self.context.try_timeout().run_ignoring(
                    || -> Result<()> { Ok(self.driver()?.get(url)?) },
                    |e| matches!(e, Error::Driver(DriverError::Timeout(_))),
                )?;
                self.page_info_result()
            })?
    }

    /// Reloads the current page and logs what it shows.
    pub fn refresh(&self) -> Result<()> {
        let _interaction = self.interaction().entered()?;
        self.request(Some("refresh"));
        self.driver()?.refresh()?;
        self.page_info_result()
    }

    /// Clicks wherever the pointer currently is.
    pub fn click(&self) -> Result<()> {
        let _interaction = self.interaction().entered()?;
        self.request(Some("click"));
        self.driver()?.click()?;
        Ok(())
    }

    /// First element of the page matching the XPath `selector`.
    pub fn get_element(&self, selector: &str) -> Result<Element<D::Element>> {
        traced_get_element(self, selector, || {
            Ok(self.driver()?.find_element(By::XPath, selector)?)
        })
    }

    pub fn get_elements(&self, selector: &str) -> Result<Vec<Element<D::Element>>> {
        traced_get_elements(self, selector, || {
            Ok(self.driver()?.find_elements(By::XPath, selector)?)
        })
    }

    /// [`get_element`](Self::get_element), polled until the element shows
    /// up and isn't stale.
    #[describe]
    pub fn get_element_retry(
        &self,
        selector: &str,
        timeout: Option<Duration>,
    ) -> Result<Element<D::Element>> {
        retry_get_element(&self.context, timeout, || self.get_element(selector))
    }

    /// Logs the page title and, if one shows up within [`HEADER_TIMEOUT`],
    /// the text of its first `h1`.
    pub fn page_info_result(&self) -> Result<()> {
        let mut result = self.result(None);
        result.enter()?;
        let title = self.driver()?.title()?;
        result.log(format!("Title: {title}"));

        let header = self
            .context
            .try_timeout()
            .timeout(HEADER_TIMEOUT)
            .run_ignoring(
                || -> Result<String> {
                    let h1 = self.driver()?.find_element(By::XPath, "//h1")?;
                    Ok(h1.text()?)
                },
                |e| matches!(e, Error::Driver(DriverError::NoSuchElement(_))),
            );
        match header {
            Ok(header) => result.log(format!("Header: {header}")),
            // a missing header is not an error
            Err(e) => {
                if let Some(e) = e.into_failed() {
                    return Err(e);
                }
            }
        }
        result.exit()
    }

    pub fn debug_info(&self) -> Result<WebBrowserDebugInfo> {
        let mut driver = self.driver()?;
        Ok(WebBrowserDebugInfo {
            url: driver.current_url()?,
            title: driver.title()?,
            name: driver.name(),
            window: driver.window_rect()?,
        })
    }
}

impl<D: Driver> Entity for WebBrowser<D> {
    fn context(&self) -> &Context {
        &self.context
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Entity for one element of a page.
///
/// It is named after the element's tag, the `name`, `placeholder` and `value`
/// attributes it has, and its text, like HTML:
/// `<input name='user' placeholder='Login' />` or `<h1>Welcome</h1>`.  The
/// name is taken when the element is wrapped.
pub struct Element<E> {
    context: Context,
    name: String,
    handle: E,
}

impl<E> Debug for Element<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

impl<E> Display for Element<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

fn element_name<E: DriverElement>(handle: &E) -> Result<String, DriverError> {
    let tag = handle.tag_name()?;
    let mut name = format!("<{tag}");
    for attribute in NAMED_ATTRIBUTES {
        if let Some(value) = handle.attribute(attribute)? {
            name.push_str(&format!(" {attribute}='{value}'"));
        }
    }
    let text = handle.text()?;
    if text.is_empty() {
        name.push_str(" />");
    } else {
        name.push_str(&format!(">{}</{tag}>", truncate(text)));
    }
    Ok(name)
}

impl<E: DriverElement> Element<E> {
    pub fn new(context: Context, handle: E) -> Result<Self> {
        let name = element_name(&handle)?;
        Ok(Element {
            context,
            name,
            handle,
        })
    }

    pub fn handle(&self) -> &E {
        &self.handle
    }

    pub fn into_handle(self) -> E {
        self.handle
    }

    fn act(&self, action: &str, f: impl FnOnce(&E) -> Result<(), DriverError>) -> Result<()> {
        let _interaction = self.interaction().entered()?;
        self.request(Some(action));
        f(&self.handle)?;
        Ok(())
    }

    /// Types `value` into the element.
    ///
    /// The request shows `value`'s `Debug` rendering, which is masked for a
    /// [`SecretString`](crate::secret::SecretString) and whenever `hidden` is
    /// set.
    pub fn send_keys<T>(&self, value: &T, hidden: bool) -> Result<()>
    where
        T: Debug + AsRef<str> + ?Sized,
    {
        let request = format!("send_keys {}", render_masked(value, hidden));
        self.act(&request, |handle| handle.send_keys(value.as_ref()))
    }

    pub fn click(&self) -> Result<()> {
        self.act("click", E::click)
    }

    pub fn clear(&self) -> Result<()> {
        self.act("clear", E::clear)
    }

    pub fn submit(&self) -> Result<()> {
        self.act("submit", E::submit)
    }

    /// Value of attribute `name`, logged as `None` when absent.
    pub fn get_attribute(&self, name: &str) -> Result<Option<String>> {
        let _interaction = self.interaction().entered()?;
        self.request(Some(format!("get_attribute {name}").as_str()))
            .run(|_| -> Result<Option<String>> {
                let value = self.handle.attribute(name)?;
                self.result(None)
                    .run(|result| result.log(value.as_deref().unwrap_or("None")))?;
                Ok(value)
            })?
    }

    /// First descendant matching the XPath `selector`.
    pub fn get_element(&self, selector: &str) -> Result<Element<E>> {
        traced_get_element(self, selector, || {
            Ok(self.handle.find_element(By::XPath, selector)?)
        })
    }

    pub fn get_elements(&self, selector: &str) -> Result<Vec<Element<E>>> {
        traced_get_elements(self, selector, || {
            Ok(self.handle.find_elements(By::XPath, selector)?)
        })
    }

    /// [`get_element`](Self::get_element), polled until the descendant shows
    /// up and isn't stale.
    #[describe]
    pub fn get_element_retry(
        &self,
        selector: &str,
        timeout: Option<Duration>,
    ) -> Result<Element<E>> {
        retry_get_element(&self.context, timeout, || self.get_element(selector))
    }
}

impl<E: DriverElement> Entity for Element<E> {
    fn context(&self) -> &Context {
        &self.context
    }

    fn name(&self) -> &str {
        &self.name
    }
}
