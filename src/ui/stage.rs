use iced::widget::{container, image, mouse_area, stack, text};
use iced::{Background, Border, Color, ContentFit, Element, Length, Theme};

use crate::source::OverlayLayer;
use crate::state::OverlayState;
use crate::Message;

/// Frame thickness around the stage, in logical pixels
pub const FRAME: f32 = 4.0;

const FRAME_IDLE: Color = Color::from_rgb(0.149, 0.149, 0.149);
const FRAME_ACTIVE: Color = Color::from_rgb(0.231, 0.51, 0.965);
const FILL_IDLE: Color = Color::from_rgb(0.96, 0.96, 0.96);
const FILL_ACTIVE: Color = Color::from_rgb(0.937, 0.965, 1.0);

/// The framed comparison area
///
/// Without a design image it is a click/drop target. With one it stacks
/// the design and, when a URL is set and its layer has loaded, the
/// overlay at the current opacity. Both layers are stretched to the
/// stage dimensions.
pub fn stage<'a>(
    state: &'a OverlayState,
    layer: Option<&'a OverlayLayer>,
    drop_active: bool,
) -> Element<'a, Message> {
    let width = state.width as f32;
    let height = state.height as f32;

    let content: Element<'a, Message> = match &state.image {
        Some(design) => {
            let mut layers = stack![image(design.handle.clone())
                .width(Length::Fixed(width))
                .height(Length::Fixed(height))
                .content_fit(ContentFit::Fill)];

            if let Some(layer) = layer.filter(|_| state.shows_overlay()) {
                layers = layers.push(
                    image(layer.handle.clone())
                        .width(Length::Fixed(width))
                        .height(Length::Fixed(height))
                        .content_fit(ContentFit::Fill)
                        .opacity(state.opacity_fraction()),
                );
            }
            layers.into()
        }
        None => mouse_area(
            container(text("Add image to compare to").size(48).color(FRAME_IDLE))
                .center(Length::Fill),
        )
        .on_press(Message::PickImage)
        .into(),
    };

    container(content)
        .padding(FRAME)
        .width(Length::Fixed(width + 2.0 * FRAME))
        .height(Length::Fixed(height + 2.0 * FRAME))
        .style(move |_theme: &Theme| frame_style(drop_active))
        .into()
}

fn frame_style(drop_active: bool) -> container::Style {
    let (border, fill) = if drop_active {
        (FRAME_ACTIVE, FILL_ACTIVE)
    } else {
        (FRAME_IDLE, FILL_IDLE)
    };

    container::Style {
        background: Some(Background::Color(fill)),
        border: Border {
            color: border,
            width: FRAME,
            radius: 12.0.into(),
        },
        ..Default::default()
    }
}
