//! Confirmation mail bodies handed to the notifier after a booking commits.

use domains::{MailData, Reservation, DATE_FORMAT};

pub fn guest_confirmation(reservation: &Reservation, from: &str) -> MailData {
    let room = reservation.room_name.as_deref().unwrap_or("your room");
    let content = format!(
        "<strong>Reservation Confirmation</strong><br>\
         Dear {name},<br>\
         This is to confirm your reservation of {room} from {start} to {end}.<br>\
         Your reservation number is {id}.",
        name = reservation.guest.first_name,
        start = reservation.stay.start().format(DATE_FORMAT),
        end = reservation.stay.end().format(DATE_FORMAT),
        id = reservation.id,
    );
    MailData {
        to: reservation.guest.email.clone(),
        from: from.to_string(),
        subject: "Reservation Confirmation".into(),
        content,
    }
}

pub fn owner_notice(reservation: &Reservation, from: &str, owner: &str) -> MailData {
    let room = reservation
        .room_name
        .clone()
        .unwrap_or_else(|| format!("room {}", reservation.room_id));
    let content = format!(
        "<strong>Reservation Notification</strong><br>\
         A reservation has been made for {room} from {start} to {end} by {guest} ({email}).",
        start = reservation.stay.start().format(DATE_FORMAT),
        end = reservation.stay.end().format(DATE_FORMAT),
        guest = reservation.guest.full_name(),
        email = reservation.guest.email,
    );
    MailData {
        to: owner.to_string(),
        from: from.to_string(),
        subject: "Reservation Notification".into(),
        content,
    }
}
